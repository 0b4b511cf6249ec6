pub mod mailer;
pub mod movies;
pub mod providers;
pub mod search;

pub use mailer::{DisabledMailer, Mailer, SmtpMailer};
pub use providers::{CatalogSource, TmdbProvider};
