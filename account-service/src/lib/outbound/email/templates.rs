use url::Url;

/// Subject and HTML body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

pub fn confirmation_email(link: &Url) -> RenderedEmail {
    RenderedEmail {
        subject: "Confirm your email".to_string(),
        html: render(
            "And one last thing…<br>Let’s verify your email.",
            "Just confirm your address and your account is ready to use.",
            "Confirm email",
            link,
        ),
    }
}

pub fn password_reset_email(link: &Url) -> RenderedEmail {
    RenderedEmail {
        subject: "Reset your password".to_string(),
        html: render(
            "Forgot your password?",
            "Use the button below to choose a new one. The link expires in 24 hours.",
            "Reset password",
            link,
        ),
    }
}

fn render(heading: &str, body: &str, action: &str, link: &Url) -> String {
    format!(
        r#"<div style="text-align: center; font-family: Arial, sans-serif;">
    <h2>{heading}</h2>
    <p>{body}</p>
    <a href="{href}" style="background-color: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; font-size: 18px; display: inline-block;">
        {action}
    </a>
    <p style="font-size: 12px; color: #888;">If you did not request this email you can ignore it.</p>
</div>"#,
        heading = heading,
        body = body,
        href = escape_attribute(link.as_str()),
        action = action,
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
