//! HTML bodies for event notifications.

use crate::models::{Event, User};
use crate::notify::Notification;
use crate::utils::datetime;

fn layout(username: &str, content: &str) -> String {
    format!(
        r#"<html>
<head></head>
<body>
    <div style="border: 1px solid #ddd; border-radius: 8px; padding: 20px; max-width: 400px; margin: 20px auto; font-family: 'Arial', sans-serif; background-color: #f9f9f9;">
        <h2 style="color: #007BFF; text-align: center; margin-top: 0;">Welcome to Event Management!</h2>
        <p>Dear {username},</p>
        {content}
        <br>
        <p>Regards,</p>
        <p style="font-style: italic;">The Event Management team</p>
    </div>
</body>
</html>"#
    )
}

fn event_details(event: &Event) -> String {
    format!(
        r#"<p>Start time: <i>{start}</i></p>
        <p>End time: <i>{end}</i></p>
        <p>Location: <i>{location}</i></p>"#,
        start = datetime::display(&event.start_time),
        end = datetime::display(&event.end_time),
        location = escape(&event.location),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn registered(event: &Event, user: &User) -> Notification {
    let organizer_email = escape(&event.organizer.email);
    let content = format!(
        r#"<p>Thank you for registering at <strong>{title}</strong>!</p>
        {details}
        <br>
        <p>If you have any questions, contact organizer at <a href="mailto:{organizer_email}">{organizer_email}</a></p>"#,
        title = escape(&event.title),
        details = event_details(event),
    );

    Notification {
        subject: format!("You are registered at {}", event.title),
        body: layout(&escape(&user.username), &content),
        recipients: vec![user.email.clone()],
    }
}

pub fn unregistered(event: &Event, user: &User) -> Notification {
    let content = format!(
        "<p>You've successfully canceled your registration at <strong>{}</strong>.</p>",
        escape(&event.title)
    );

    Notification {
        subject: format!("Registration canceled for {}", event.title),
        body: layout(&escape(&user.username), &content),
        recipients: vec![user.email.clone()],
    }
}

pub fn created(event: &Event) -> Notification {
    let content = format!(
        "<p>Your event <strong>{}</strong> has been published.</p>\n        {}",
        escape(&event.title),
        event_details(event)
    );

    Notification {
        subject: format!("Your event {} was created", event.title),
        body: layout(&escape(&event.organizer.username), &content),
        recipients: vec![event.organizer.email.clone()],
    }
}

/// Sent to every participant; no recipients when nobody registered yet.
pub fn updated(event: &Event) -> Notification {
    let content = format!(
        "<p>The event <strong>{}</strong> you registered for has changed.</p>\n        {}",
        escape(&event.title),
        event_details(event)
    );

    Notification {
        subject: format!("{} has been updated", event.title),
        body: layout("participant", &content),
        recipients: event.participants.iter().map(|p| p.email.clone()).collect(),
    }
}
