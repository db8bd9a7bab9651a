//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::{NewsItem, OrderLine, Product, User};

use super::menu::MenuAction;

fn button(label: impl Into<String>, action: MenuAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.data())
}

/// Format a price the way the catalog shows it
pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// Main menu, with the admin panel entry for the administrator
pub fn main_menu_keyboard(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button("Products", MenuAction::Products)],
        vec![button("My Orders", MenuAction::MyOrders)],
        vec![button("Profile", MenuAction::Profile)],
        vec![button("News", MenuAction::News)],
    ];
    if is_admin {
        rows.push(vec![button("Admin Panel", MenuAction::AdminPanel)]);
    }
    InlineKeyboardMarkup::new(rows)
}

/// Administrator menu
pub fn admin_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("View Orders", MenuAction::ViewOrders)],
        vec![button("Add Product", MenuAction::AddProduct)],
        vec![button("Edit Product", MenuAction::EditProduct)],
        vec![button("Delete Product", MenuAction::DeleteProduct)],
        vec![button("Add News", MenuAction::AddNews)],
        vec![button("Back", MenuAction::Back)],
    ])
}

/// Single "Back" button leading to `target`
pub fn back_keyboard(target: MenuAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("Back", target)]])
}

/// One button per product, each leading to `action(product_id)`, then Back
pub fn product_list_keyboard(
    products: &[Product],
    action: fn(i64) -> MenuAction,
    back: MenuAction,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = products
        .iter()
        .map(|product| {
            vec![button(
                format!("{} - {}", product.name, format_price(product.price)),
                action(product.id),
            )]
        })
        .collect();
    rows.push(vec![button("Back", back)]);
    InlineKeyboardMarkup::new(rows)
}

/// Customer catalog
pub fn catalog_keyboard(products: &[Product]) -> InlineKeyboardMarkup {
    product_list_keyboard(products, MenuAction::ProductDetail, MenuAction::Back)
}

/// Buttons under a product detail page
pub fn product_detail_keyboard(product_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("Add to Cart", MenuAction::AddToCart(product_id))],
        vec![button("Back", MenuAction::Products)],
    ])
}

pub fn format_product_detail(product: &Product) -> String {
    format!(
        "{}\nPrice: {}\nDescription: {}",
        product.name,
        format_price(product.price),
        product.description
    )
}

fn format_order_line(line: &OrderLine) -> String {
    let name = line.product_name.as_deref().unwrap_or("(removed product)");
    let price = line
        .price
        .map(format_price)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Order #{}: {} - {} x {} ({})",
        line.id, name, price, line.quantity, line.status
    )
}

/// A customer's own order history
pub fn format_user_orders(lines: &[OrderLine]) -> String {
    let mut result = String::from("Your orders:\n");
    for line in lines {
        result.push_str(&format!(
            "{} on {}\n",
            format_order_line(line),
            line.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    result
}

/// Every order, with the buyer, for the administrator
pub fn format_all_orders(lines: &[OrderLine]) -> String {
    let mut result = String::from("All orders:\n");
    for line in lines {
        result.push_str(&format!(
            "{} by User {} on {}\n",
            format_order_line(line),
            line.user_id,
            line.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    result
}

pub fn format_profile(user: &User, order_count: usize) -> String {
    format!(
        "Profile\nPhone: {}\nVerified: {}\nTotal Orders: {}",
        user.phone_number,
        if user.is_verified { "Yes" } else { "No" },
        order_count
    )
}

pub fn format_news(items: &[NewsItem]) -> String {
    let mut result = String::from("Latest News:\n");
    for item in items {
        result.push_str(&format!(
            "{}: {}\n",
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.content
        ));
    }
    result
}
