pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod two_factor;
pub use self::two_factor::{confirm, enroll};

pub mod me;
pub use self::me::me;

pub mod types;
pub mod utils;
