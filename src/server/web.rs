//! Mock login web flow
//!
//! `GET /mockWebPage?sessionId=...` renders a form offering the allowed
//! identities; `POST /login` completes the login for the chosen identity and
//! binds it to the session the page was opened for.

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use super::AppState;
use crate::auth::{Identity, SessionId};
use crate::error::ToolgateError;

/// Query string of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Form submitted by the login page.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

pub(super) async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginPageQuery>,
) -> Response {
    let Some(session) = query
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Html(result_page("Login failed", "Missing sessionId parameter.")),
        )
            .into_response();
    };

    let identities = state
        .notifier
        .allowed_identities_for(&SessionId::from(session.as_str()));
    Html(render_login_form(&session, &identities)).into_response()
}

pub(super) async fn submit_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let session = form.session_id.trim();
    let phone = form.phone_number.trim();
    if session.is_empty() || phone.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Html(result_page(
                "Login failed",
                "Both sessionId and phoneNumber are required.",
            )),
        )
            .into_response();
    }

    match state
        .notifier
        .complete_login(&SessionId::from(session), &Identity::from(phone))
    {
        Ok(completion) => {
            tracing::debug!(snapshot = ?state.store.snapshot(), "Auth store after login");
            (
                StatusCode::OK,
                Html(result_page(
                    "Login successful",
                    &format!(
                        "Logged in as {}. You can close this page and return to your assistant.",
                        completion.identity
                    ),
                )),
            )
                .into_response()
        }
        Err(ToolgateError::IdentityNotAllowed(_)) => (
            StatusCode::FORBIDDEN,
            Html(result_page("Login failed", "This phone number is not allowed.")),
        )
            .into_response(),
        Err(ToolgateError::SessionConflict { existing, .. }) => (
            StatusCode::CONFLICT,
            Html(result_page(
                "Login failed",
                &format!("This session is already signed in as {}.", existing),
            )),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(result_page("Login failed", "Unexpected error.")),
            )
                .into_response()
        }
    }
}

fn render_login_form(session: &str, identities: &[Identity]) -> String {
    let mut options = String::new();
    for identity in identities {
        let value = escape_html(identity.as_str());
        options.push_str(&format!("<option value=\"{0}\">{0}</option>", value));
    }

    let input = if identities.is_empty() {
        "<input type=\"text\" name=\"phoneNumber\" required>".to_string()
    } else {
        format!("<select name=\"phoneNumber\">{}</select>", options)
    };

    format!(
        "<!DOCTYPE html>\n<html><head><title>Login</title></head><body>\
         <h1>Login</h1>\
         <form method=\"post\" action=\"/login\">\
         <input type=\"hidden\" name=\"sessionId\" value=\"{}\">\
         <label>Phone number {}</label>\
         <button type=\"submit\">Login</button>\
         </form></body></html>",
        escape_html(session),
        input
    )
}

fn result_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>{0}</title></head><body><h1>{0}</h1><p>{1}</p></body></html>",
        escape_html(title),
        escape_html(message)
    )
}

/// Escapes text for inclusion in HTML content or a quoted attribute.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_form_embeds_escaped_session() {
        let page = render_login_form("s\"1", &[Identity::from("+1111")]);
        assert!(page.contains("name=\"sessionId\" value=\"s&quot;1\""));
        assert!(page.contains("<option value=\"+1111\">+1111</option>"));
    }

    #[test]
    fn test_form_without_identities_uses_text_input() {
        let page = render_login_form("s1", &[]);
        assert!(page.contains("type=\"text\" name=\"phoneNumber\""));
        assert!(!page.contains("<select"));
    }
}
