//! Signup and login form endpoints
//!
//! - `POST /signup` - multipart form: `username`, `password`, optional `profileImage` file
//! - `POST /login` - urlencoded form: `username`, `password`

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::websocket::state::AppState;
use crate::auth::AuthError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::DuplicateUsername(_) => (StatusCode::BAD_REQUEST, "Username already exists"),
            AuthError::UserNotFound => (StatusCode::UNAUTHORIZED, "User not found"),
            AuthError::InvalidPassword => (StatusCode::UNAUTHORIZED, "Invalid password"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Error saving user data"),
        }
        .into_response()
    }
}

/// Uploaded profile picture
#[derive(Debug)]
struct ProfileImage {
    file_name: String,
    bytes: Vec<u8>,
}

/// Parsed signup form
#[derive(Debug, Default)]
struct SignupForm {
    username: Option<String>,
    password: Option<String>,
    profile_image: Option<ProfileImage>,
}

impl SignupForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, Response> {
        let mut form = SignupForm::default();

        while let Some(field) = multipart.next_field().await.map_err(IntoResponse::into_response)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("username") => {
                    form.username = Some(field.text().await.map_err(IntoResponse::into_response)?);
                }
                Some("password") => {
                    form.password = Some(field.text().await.map_err(IntoResponse::into_response)?);
                }
                Some("profileImage") => {
                    let file_name = field.file_name().and_then(base_file_name);
                    let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
                    if let Some(file_name) = file_name.filter(|_| !bytes.is_empty()) {
                        form.profile_image = Some(ProfileImage {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Strip any directory components a client put in an upload name
fn base_file_name(raw: &str) -> Option<String> {
    // browsers on Windows may send backslash paths
    let last = raw.rsplit(['/', '\\']).next()?;
    let name = Path::new(last).file_name()?.to_str()?;
    (!name.is_empty() && name != "..").then(|| name.to_string())
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /signup - create an account, then send the browser to the login page
pub async fn signup(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let form = match SignupForm::read(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let username = required(form.username);
    let password = required(form.password);
    let (Some(username), Some(password)) = (username, password) else {
        return (StatusCode::BAD_REQUEST, "Username and password are required").into_response();
    };

    if state.credentials.contains(&username) {
        return AuthError::DuplicateUsername(username).into_response();
    }

    let upload_dir = state.config.upload_dir.clone();
    let profile_ref = match &form.profile_image {
        Some(image) => match store_upload(&upload_dir, image).await {
            Ok(name) => Some(name),
            Err(e) => {
                error!("Error saving profile image {}: {}", image.file_name, e);
                return AuthError::Io(e).into_response();
            }
        },
        None => None,
    };

    let store = Arc::clone(&state.credentials);
    let stored = profile_ref.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.create_account(&username, &password, stored)
    })
    .await;

    let response = match result {
        Ok(Ok(record)) => {
            info!(username = %record.username, "account created");
            return Redirect::to("/login").into_response();
        }
        Ok(Err(e)) => {
            warn!(error = %e, "signup rejected");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "signup task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    // no account references the upload
    if let Some(name) = profile_ref {
        if let Err(e) = tokio::fs::remove_file(upload_dir.join(&name)).await {
            warn!("Error removing orphaned upload {}: {}", name, e);
        }
    }
    response
}

/// Save an upload without replacing an existing file. A taken name gets a
/// random prefix. Returns the name the file was stored under.
async fn store_upload(dir: &Path, image: &ProfileImage) -> io::Result<String> {
    tokio::fs::create_dir_all(dir).await?;

    match write_new(&dir.join(&image.file_name), &image.bytes).await {
        Ok(()) => Ok(image.file_name.clone()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let name = format!("{}-{}", Uuid::new_v4().simple(), image.file_name);
            write_new(&dir.join(&name), &image.bytes).await?;
            Ok(name)
        }
        Err(e) => Err(e),
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

/// Login form body. Missing fields read as empty and fail verification.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /login - verify credentials, then open the chat page
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let store = Arc::clone(&state.credentials);
    let username = form.username.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.verify_credentials(&form.username, &form.password)
    })
    .await;

    match result {
        Ok(Ok(user)) => {
            info!(username = %user.username, "login succeeded");
            let target = format!("/chat?user={}", urlencoding::encode(&user.username));
            Redirect::to(&target).into_response()
        }
        Ok(Err(e)) => {
            info!(username = %username, reason = %e, "login rejected");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "login task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
