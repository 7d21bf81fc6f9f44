pub mod auth;
pub mod errors;
pub mod location;
pub mod order;
pub mod pagination;
pub mod stock;
pub mod user;

pub use auth::{LoginRequest, LoginResponse, LoginUser, RefreshRequest, TokenPair};
pub use errors::{ErrorResponse, ValidationErrors};
pub use location::Location;
pub use order::{
    CreateOrderRequest, Order, OrderItem, OrderLine, OrderStatus, OrdersPage, OrdersPagination,
    OrdersResponse,
};
pub use pagination::{clamp_page, page_window};
pub use stock::{ProductCategory, ProductInfo, StockItem, StockPage, StockPagination};
pub use user::{ChangePasswordRequest, EditUserRequest, PasswordChangeForm, UserProfile};
