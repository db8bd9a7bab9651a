//! Inline button identifiers and their parsed form.

use std::fmt;

/// Who may trigger an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Verified,
    Admin,
}

/// A parsed inline button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Products,
    ProductDetail(i64),
    AddToCart(i64),
    MyOrders,
    Profile,
    News,
    Back,
    AdminPanel,
    ViewOrders,
    AddProduct,
    EditProduct,
    EditSelect(i64),
    DeleteProduct,
    DeleteSelect(i64),
    AddNews,
    Unknown(String),
}

// Parameterized routes, longest prefixes first so `product_` never shadows them
const PREFIX_ROUTES: [(&str, fn(i64) -> MenuAction); 4] = [
    ("add_to_cart_", MenuAction::AddToCart),
    ("edit_select_", MenuAction::EditSelect),
    ("delete_select_", MenuAction::DeleteSelect),
    ("product_", MenuAction::ProductDetail),
];

impl MenuAction {
    /// Parse callback data. Anything unrecognized becomes [`MenuAction::Unknown`].
    pub fn parse(data: &str) -> Self {
        let exact = match data {
            "products" => Some(MenuAction::Products),
            "my_orders" => Some(MenuAction::MyOrders),
            "profile" => Some(MenuAction::Profile),
            "news" => Some(MenuAction::News),
            "back" => Some(MenuAction::Back),
            "admin_panel" => Some(MenuAction::AdminPanel),
            "view_orders" => Some(MenuAction::ViewOrders),
            "add_product" => Some(MenuAction::AddProduct),
            "edit_product" => Some(MenuAction::EditProduct),
            "delete_product" => Some(MenuAction::DeleteProduct),
            "add_news" => Some(MenuAction::AddNews),
            _ => None,
        };
        if let Some(action) = exact {
            return action;
        }

        PREFIX_ROUTES
            .iter()
            .find_map(|(prefix, route)| {
                data.strip_prefix(prefix)
                    .and_then(|id| id.parse::<i64>().ok())
                    .map(route)
            })
            .unwrap_or_else(|| MenuAction::Unknown(data.to_string()))
    }

    /// Callback data that parses back into this action
    pub fn data(&self) -> String {
        match self {
            MenuAction::Products => "products".to_string(),
            MenuAction::ProductDetail(id) => format!("product_{id}"),
            MenuAction::AddToCart(id) => format!("add_to_cart_{id}"),
            MenuAction::MyOrders => "my_orders".to_string(),
            MenuAction::Profile => "profile".to_string(),
            MenuAction::News => "news".to_string(),
            MenuAction::Back => "back".to_string(),
            MenuAction::AdminPanel => "admin_panel".to_string(),
            MenuAction::ViewOrders => "view_orders".to_string(),
            MenuAction::AddProduct => "add_product".to_string(),
            MenuAction::EditProduct => "edit_product".to_string(),
            MenuAction::EditSelect(id) => format!("edit_select_{id}"),
            MenuAction::DeleteProduct => "delete_product".to_string(),
            MenuAction::DeleteSelect(id) => format!("delete_select_{id}"),
            MenuAction::AddNews => "add_news".to_string(),
            MenuAction::Unknown(data) => data.clone(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            MenuAction::Products
            | MenuAction::ProductDetail(_)
            | MenuAction::AddToCart(_)
            | MenuAction::MyOrders
            | MenuAction::Profile
            | MenuAction::News
            | MenuAction::Back => Access::Verified,
            MenuAction::AdminPanel
            | MenuAction::ViewOrders
            | MenuAction::AddProduct
            | MenuAction::EditProduct
            | MenuAction::EditSelect(_)
            | MenuAction::DeleteProduct
            | MenuAction::DeleteSelect(_)
            | MenuAction::AddNews => Access::Admin,
            MenuAction::Unknown(_) => Access::Anyone,
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data())
    }
}
