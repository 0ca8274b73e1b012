pub mod db;
pub mod passwords;
pub mod tokens;

pub use db::DbAdapter;
pub use passwords::Argon2PasswordService;
pub use tokens::JwtTokenService;
