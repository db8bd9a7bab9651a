//! User-facing text sent by the bot, kept in one place.

use crate::dialogue::EditField;

pub const WELCOME: &str = "Welcome to our shop!";
pub const HELP: &str = "Use /start to open the shop menu.\n\
    New customers verify their phone number first: send it in international \
    format (e.g., +998901234567) and then the one-time code you receive.\n\
    Browse products, add them to your cart and check your orders from the menu buttons.";

// Verification
pub const PHONE_PROMPT: &str = "Please enter your phone number (e.g., +998901234567):";
pub const PHONE_INVALID: &str = "Invalid phone number. Please use format: +998901234567";
pub const OTP_INVALID: &str = "Invalid OTP. Try again:";
pub const VERIFIED: &str = "Verification successful! Use /start to continue.";

pub fn otp_sent(otp: &str) -> String {
    format!("OTP sent: {otp} (for demo, shown here). Enter the OTP:")
}

// Callback notices
pub const VERIFY_FIRST: &str = "Please verify your phone number first!";
pub const NOT_ADMIN: &str = "You are not an admin!";
pub const UNKNOWN_ACTION: &str = "Unknown action.";
pub const PRODUCT_NOT_FOUND: &str = "Product not found!";
pub const PRODUCT_DISPLAY_ERROR: &str = "Error displaying product. Please try again.";
pub const ADDED_TO_CART: &str = "Product added to cart!";
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

// Menus
pub const SELECT_PRODUCT: &str = "Select a product:";
pub const CATALOG_EMPTY: &str = "No products available yet.";
pub const NO_ORDERS: &str = "You have no orders!";
pub const NO_NEWS: &str = "No news available!";
pub const ADMIN_PANEL: &str = "Admin Panel:";
pub const NO_ORDERS_FOUND: &str = "No orders found!";
pub const SELECT_PRODUCT_TO_EDIT: &str = "Select product to edit:";
pub const SELECT_PRODUCT_TO_DELETE: &str = "Select product to delete:";

// Product creation
pub const ENTER_PRODUCT_NAME: &str = "Enter product name:";
pub const ENTER_PRODUCT_PRICE: &str = "Enter product price (e.g., 99.99):";
pub const PRICE_INVALID: &str = "Invalid price. Enter a number (e.g., 99.99):";
pub const ENTER_PRODUCT_DESCRIPTION: &str = "Enter product description:";
pub const SEND_PRODUCT_MEDIA: &str = "Send an image or video (or type 'skip' to skip):";
pub const PRODUCT_ADDED: &str = "Product added!";
pub const PRODUCT_ADDED_WITH_MEDIA: &str = "Product added with media!";
pub const MEDIA_FAILED: &str = "Error processing media. Please try again or type 'skip'.";

// Product editing and deletion
pub const CHOOSE_EDIT_FIELD: &str = "Which field to edit? (name, price, description, image, video)";
pub const EDIT_FIELD_INVALID: &str = "Invalid field. Choose: name, price, description, image, video";
pub const EDIT_PRICE_INVALID: &str = "Invalid price. Enter a number:";
pub const MEDIA_EDIT_FAILED: &str = "Error processing media. Please send it again or type a URL.";
pub const PRODUCT_DELETED: &str = "Product deleted!";
pub const PRODUCT_ID_INVALID: &str = "Invalid product ID. Enter a number:";

pub fn enter_new_value(field: EditField) -> String {
    format!("Enter new {field} (for price, use number; for image/video, send media or URL):")
}

pub fn field_updated(field: EditField) -> String {
    format!("Product {field} updated!")
}

pub fn confirm_deletion(product_id: i64) -> String {
    format!("Enter the product ID ({product_id}) to confirm deletion:")
}

pub fn product_id_not_found(product_id: i64) -> String {
    format!("Product #{product_id} not found.")
}

// News
pub const ENTER_NEWS: &str = "Enter news content:";

pub fn news_broadcast(content: &str) -> String {
    format!("News: {content}")
}

pub fn news_posted(delivered: usize, recipients: usize) -> String {
    format!("News posted and broadcasted! Delivered to {delivered} of {recipients} users.")
}
