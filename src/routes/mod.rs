mod health_check;
mod session;

pub use health_check::health_check;
pub use session::{get_current_user, login, logout, logout_all, refresh, signup};
