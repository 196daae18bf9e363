//! Outbound email: password resets and inquiry notifications.
//!
//! Every inquiry produces two messages, one to the business inbox
//! (`email.admin_email`) and a confirmation to the customer. Bodies are plain
//! inline-styled HTML so they render in any client.

use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::{
    config::{BusinessConfig, Config, EmailTransportConfig},
    db::models::{locations::ContactInquiryDBResponse, private_events::EventInquiryDBResponse},
    errors::Error,
};
use uuid::Uuid;

const ACCENT: &str = "#059669";

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    admin_email: String,
    frontend_url: String,
    business: BusinessConfig,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port);

                let smtp_builder = if username.is_empty() {
                    smtp_builder
                } else {
                    smtp_builder.credentials(Credentials::new(username.clone(), password.clone()))
                };

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            admin_email: email_config.admin_email.clone(),
            frontend_url: email_config.frontend_url.trim_end_matches('/').to_string(),
            business: config.business.clone(),
        })
    }

    pub async fn send_password_reset_email(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        token_id: &Uuid,
        token: &str,
    ) -> Result<(), Error> {
        let reset_link = format!("{}/reset-password?id={}&token={}", self.frontend_url, token_id, token);
        let body = self.password_reset_body(to_name, &reset_link);
        self.send_email(to_email, to_name, "Password Reset Request", &body).await
    }

    /// Notify the business inbox of a new private event inquiry.
    pub async fn send_event_inquiry_notification(&self, inquiry: &EventInquiryDBResponse) -> Result<(), Error> {
        let subject = format!("New Private Event Inquiry - {}", inquiry.event_type);
        let body = event_inquiry_admin_body(inquiry);
        self.send_email(&self.admin_email, None, &subject, &body).await
    }

    pub async fn send_event_inquiry_confirmation(&self, inquiry: &EventInquiryDBResponse) -> Result<(), Error> {
        let body = self.event_inquiry_confirmation_body(inquiry);
        self.send_email(
            &inquiry.contact_email,
            Some(&inquiry.contact_name),
            &format!("Thank you for your {} event inquiry!", self.business.name),
            &body,
        )
        .await
    }

    /// Notify the business inbox of a new contact form submission.
    pub async fn send_contact_inquiry_notification(&self, inquiry: &ContactInquiryDBResponse) -> Result<(), Error> {
        let subject = format!("New Contact Inquiry - {}", inquiry.subject);
        let body = contact_inquiry_admin_body(inquiry);
        self.send_email(&self.admin_email, None, &subject, &body).await
    }

    pub async fn send_contact_inquiry_confirmation(&self, inquiry: &ContactInquiryDBResponse) -> Result<(), Error> {
        let body = self.contact_inquiry_confirmation_body(inquiry);
        self.send_email(
            &inquiry.email,
            Some(&inquiry.name),
            &format!("Thank you for contacting {}!", self.business.name),
            &body,
        )
        .await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, subject: &str, body: &str) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal {
                operation: format!("parse from email: {e}"),
            })?;

        let address = to_email.parse::<Address>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;
        let to = Mailbox::new(to_name.map(str::to_string), address);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body.to_string())
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        tracing::debug!(subject, "email sent");
        Ok(())
    }

    fn password_reset_body(&self, to_name: Option<&str>, reset_link: &str) -> String {
        let greeting = match to_name {
            Some(name) => format!("Hello {},", escape(name)),
            None => "Hello,".to_string(),
        };

        wrap(format!(
            r#"<h2 style="color: {ACCENT};">Password Reset Request</h2>
            <p>{greeting}</p>
            <p>We received a request to reset your password. If you didn't make this request, you can safely ignore this email.</p>
            <p><a href="{reset_link}" style="color: {ACCENT};">Reset your password</a></p>
            <p>Or copy and paste this link into your browser:</p>
            <p>{reset_link}</p>
            <p style="font-size: 12px; color: #666;">This is an automated message from {name}, please do not reply.</p>"#,
            name = escape(&self.business.name),
        ))
    }

    fn event_inquiry_confirmation_body(&self, inquiry: &EventInquiryDBResponse) -> String {
        wrap(format!(
            r#"{header}
            <h2 style="color: {ACCENT};">Thank you for your event inquiry!</h2>
            <p>Dear {contact_name},</p>
            <p>We've received your inquiry for a private event and we're excited to help make your occasion special.</p>
            {details}
            <div style="background-color: #ecfdf5; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid {ACCENT};">
                <h3 style="color: {ACCENT}; margin-top: 0;">What happens next?</h3>
                <ul style="margin: 0; padding-left: 20px;">
                    <li>Our events team will review your inquiry within 24 hours</li>
                    <li>We'll contact you to discuss your needs and preferences</li>
                    <li>We'll send a custom quote for your event</li>
                </ul>
            </div>
            {contact}
            {footer}"#,
            header = self.brand_header(),
            contact_name = escape(&inquiry.contact_name),
            details = panel(
                "Your Event Details",
                &format!(
                    "{}{}{}{}{}",
                    line("Event Type", &inquiry.event_type),
                    line("Date", &inquiry.event_date.to_string()),
                    line("Time", &inquiry.event_time.format("%H:%M").to_string()),
                    line("Number of Guests", &inquiry.number_of_guests.to_string()),
                    line("Inquiry ID", &format!("#{}", inquiry.id)),
                )
            ),
            contact = self.contact_panel(),
            footer = self.brand_footer(),
        ))
    }

    fn contact_inquiry_confirmation_body(&self, inquiry: &ContactInquiryDBResponse) -> String {
        wrap(format!(
            r#"{header}
            <h2 style="color: {ACCENT};">Thank you for contacting us!</h2>
            <p>Dear {name},</p>
            <p>We've received your message. Our team will review it and get back to you as soon as possible.</p>
            {details}
            <div style="background-color: #ecfdf5; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid {ACCENT};">
                <p style="margin: 0;"><strong>Response Time:</strong> We typically respond within 24 hours during business hours.</p>
            </div>
            {contact}
            {footer}"#,
            header = self.brand_header(),
            name = escape(&inquiry.name),
            details = panel(
                "Your Message",
                &format!(
                    "{}{}{}",
                    line("Subject", &inquiry.subject),
                    line("Inquiry ID", &format!("#{}", inquiry.id)),
                    line("Submitted", &inquiry.created_at.format("%Y-%m-%d %H:%M").to_string()),
                )
            ),
            contact = self.contact_panel(),
            footer = self.brand_footer(),
        ))
    }

    fn brand_header(&self) -> String {
        format!(
            r#"<div style="text-align: center; margin-bottom: 30px;">
                <h1 style="color: {ACCENT}; margin: 0;">{}</h1>
                <p style="color: #6B7280; margin: 5px 0 0 0;">Premium Healthy Cocktails</p>
            </div>"#,
            escape(&self.business.name)
        )
    }

    fn contact_panel(&self) -> String {
        let business = &self.business;
        format!(
            r#"<p>If you have any questions, please contact us:</p>
            <div style="background-color: #f8f9fa; padding: 15px; border-radius: 8px; margin: 20px 0;">
                <p style="margin: 0;"><strong>Email:</strong> <a href="mailto:{email}" style="color: {ACCENT};">{email}</a></p>
                <p style="margin: 5px 0 0 0;"><strong>Phone:</strong> {phone}</p>
            </div>"#,
            email = escape(&business.email),
            phone = escape(&business.phone),
        )
    }

    fn brand_footer(&self) -> String {
        format!(
            r#"<div style="margin-top: 30px; text-align: center; color: #6B7280; font-size: 14px;">
                <p>{} - Premium Healthy Cocktails</p>
                <p>{}</p>
            </div>"#,
            escape(&self.business.name),
            escape(&self.business.address)
        )
    }
}

fn event_inquiry_admin_body(inquiry: &EventInquiryDBResponse) -> String {
    let drinks = if inquiry.drink_categories.is_empty() {
        "None specified".to_string()
    } else {
        inquiry.drink_categories.join(", ")
    };
    let mut event = format!(
        "{}{}{}{}{}",
        line("Event Type", &inquiry.event_type),
        line("Date", &inquiry.event_date.to_string()),
        line("Time", &inquiry.event_time.format("%H:%M").to_string()),
        line("Number of Guests", &inquiry.number_of_guests.to_string()),
        line("Drink Categories", &drinks),
    );
    if let Some(dietary) = &inquiry.dietary_requirements {
        event.push_str(&line("Dietary Requirements", dietary));
    }

    let contact = format!(
        "{}{}{}",
        line("Name", &inquiry.contact_name),
        line("Email", &inquiry.contact_email),
        line("Phone", &inquiry.contact_phone),
    );

    let message = inquiry
        .message
        .as_deref()
        .map(|m| panel("Message", &format!("<p>{}</p>", escape(m))))
        .unwrap_or_default();

    wrap(format!(
        r#"<h2 style="color: {ACCENT};">New Private Event Inquiry</h2>
        {}{}{}{}"#,
        panel("Event Details", &event),
        panel("Contact Information", &contact),
        message,
        stamp(&inquiry.id.to_string(), &inquiry.created_at.format("%Y-%m-%d %H:%M").to_string()),
    ))
}

fn contact_inquiry_admin_body(inquiry: &ContactInquiryDBResponse) -> String {
    let mut details = format!("{}{}", line("Name", &inquiry.name), line("Email", &inquiry.email));
    if let Some(phone) = &inquiry.phone {
        details.push_str(&line("Phone", phone));
    }
    details.push_str(&line("Subject", &inquiry.subject));
    details.push_str(&line("Type", &inquiry.inquiry_type));

    wrap(format!(
        r#"<h2 style="color: {ACCENT};">New Contact Inquiry</h2>
        {}{}{}"#,
        panel("Contact Details", &details),
        panel("Message", &format!("<p>{}</p>", escape(&inquiry.message))),
        stamp(&inquiry.id.to_string(), &inquiry.created_at.format("%Y-%m-%d %H:%M").to_string()),
    ))
}

fn wrap(content: String) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        {content}
    </div>
</body>
</html>"#
    )
}

fn panel(title: &str, inner: &str) -> String {
    format!(
        r#"<div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
            <h3 style="color: {ACCENT}; margin-top: 0;">{}</h3>
            {inner}
        </div>"#,
        escape(title)
    )
}

fn line(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>", escape(label), escape(value))
}

fn stamp(id: &str, submitted: &str) -> String {
    format!(
        r#"<div style="margin-top: 30px; padding: 20px; background-color: {ACCENT}; color: white; border-radius: 8px;">
            <p style="margin: 0;"><strong>Inquiry ID:</strong> {id}</p>
            <p style="margin: 5px 0 0 0;"><strong>Submitted:</strong> {submitted}</p>
        </div>"#
    )
}

/// Customer-supplied text goes into HTML bodies.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
