pub mod sendgrid;
pub mod templates;

pub use sendgrid::SendGridEmailSender;
