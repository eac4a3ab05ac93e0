// Auth seam - what we need from the identity provider, its error messages, and the start screen

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub email: String,
}

/// Provider error codes we know how to explain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    InvalidEmail,
    UserNotFound,
    WrongPassword,
    EmailAlreadyInUse,
    WeakPassword,
    Other(String),
}

impl AuthErrorCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/invalid-email" => AuthErrorCode::InvalidEmail,
            "auth/user-not-found" => AuthErrorCode::UserNotFound,
            "auth/wrong-password" => AuthErrorCode::WrongPassword,
            "auth/email-already-in-use" => AuthErrorCode::EmailAlreadyInUse,
            "auth/weak-password" => AuthErrorCode::WeakPassword,
            other => AuthErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::Other(code) => code,
        }
    }
}

/// Which form the error came from; the same code reads differently in each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    SignIn,
    SignUp,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter both email and password")]
    MissingCredentials,

    #[error("Authentication failed: {}", .0.as_code())]
    Provider(AuthErrorCode),
}

impl AuthError {
    pub fn code(code: &str) -> Self {
        AuthError::Provider(AuthErrorCode::from_code(code))
    }

    /// Text to show the user
    pub fn user_message(&self, flow: AuthFlow) -> &'static str {
        let code = match self {
            AuthError::MissingCredentials => return "Please enter both email and password",
            AuthError::Provider(code) => code,
        };

        match (flow, code) {
            (AuthFlow::SignIn, AuthErrorCode::InvalidEmail) => "Invalid email address.",
            (AuthFlow::SignIn, AuthErrorCode::UserNotFound) => "No user found with this email.",
            (AuthFlow::SignIn, AuthErrorCode::WrongPassword) => "Incorrect password.",
            (AuthFlow::SignIn, _) => "Something went wrong.",
            (AuthFlow::SignUp, AuthErrorCode::EmailAlreadyInUse) => {
                "That email address is already in use!"
            }
            (AuthFlow::SignUp, AuthErrorCode::InvalidEmail) => "That email address is invalid!",
            (AuthFlow::SignUp, AuthErrorCode::WeakPassword) => {
                "Password should be at least 6 characters."
            }
            (AuthFlow::SignUp, _) => "Something went wrong. Try again.",
        }
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// What we need from an identity provider
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// Session changes; `None` means signed out
    fn subscribe(&self) -> watch::Receiver<Option<User>>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User>;
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<User>;
    async fn sign_out(&self) -> AuthResult<()>;
}

/// Both fields required, email trimmed; password left exactly as typed
pub fn validate_credentials(email: &str, password: &str) -> AuthResult<String> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(email.to_string())
}

/// Where a session should land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScreen {
    Home,
    SignIn,
}

/// Front door: validates input before bothering the provider and decides
/// the start screen from the session
pub struct SessionGate {
    provider: Arc<dyn AuthProvider>,
}

impl SessionGate {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    pub fn start_screen(&self) -> StartScreen {
        match self.provider.current_user() {
            Some(_) => StartScreen::Home,
            None => StartScreen::SignIn,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = validate_credentials(email, password)?;
        self.provider.sign_in(&email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = validate_credentials(email, password)?;
        self.provider.sign_up(&email, password).await
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        self.provider.sign_out().await
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.provider.subscribe()
    }
}

/// In-process provider with the same rules and error codes as the hosted one
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, (String, User)>>,
    session: watch::Sender<Option<User>>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
        }
    }

    fn looks_like_email(email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        }
    }
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthProvider for MemoryAuthProvider {
    fn current_user(&self) -> Option<User> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.session.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User> {
        if !Self::looks_like_email(email) {
            return Err(AuthError::Provider(AuthErrorCode::InvalidEmail));
        }

        let user = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let (stored_password, user) = accounts
                .get(&email.to_lowercase())
                .ok_or(AuthError::Provider(AuthErrorCode::UserNotFound))?;

            if stored_password != password {
                return Err(AuthError::Provider(AuthErrorCode::WrongPassword));
            }
            user.clone()
        };

        info!("Signed in {}", user.email);
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<User> {
        if !Self::looks_like_email(email) {
            return Err(AuthError::Provider(AuthErrorCode::InvalidEmail));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Provider(AuthErrorCode::WeakPassword));
        }

        let user = {
            let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(AuthError::Provider(AuthErrorCode::EmailAlreadyInUse));
            }

            let user = User {
                uid: format!("local-{}", accounts.len() + 1),
                email: email.to_string(),
            };
            accounts.insert(key, (password.to_string(), user.clone()));
            user
        };

        // Creating an account signs you in, same as the hosted provider
        info!("Created account for {}", user.email);
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.session.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SessionGate {
        SessionGate::new(Arc::new(MemoryAuthProvider::new()))
    }

    #[test]
    fn test_code_round_trip() {
        for code in [
            "auth/invalid-email",
            "auth/user-not-found",
            "auth/wrong-password",
            "auth/email-already-in-use",
            "auth/weak-password",
            "auth/network-request-failed",
        ] {
            assert_eq!(AuthErrorCode::from_code(code).as_code(), code);
        }
    }

    #[test]
    fn test_sign_in_messages() {
        assert_eq!(
            AuthError::code("auth/invalid-email").user_message(AuthFlow::SignIn),
            "Invalid email address."
        );
        assert_eq!(
            AuthError::code("auth/user-not-found").user_message(AuthFlow::SignIn),
            "No user found with this email."
        );
        assert_eq!(
            AuthError::code("auth/wrong-password").user_message(AuthFlow::SignIn),
            "Incorrect password."
        );
        assert_eq!(
            AuthError::code("auth/too-many-requests").user_message(AuthFlow::SignIn),
            "Something went wrong."
        );
    }

    #[test]
    fn test_sign_up_messages() {
        assert_eq!(
            AuthError::code("auth/email-already-in-use").user_message(AuthFlow::SignUp),
            "That email address is already in use!"
        );
        assert_eq!(
            AuthError::code("auth/invalid-email").user_message(AuthFlow::SignUp),
            "That email address is invalid!"
        );
        assert_eq!(
            AuthError::code("auth/weak-password").user_message(AuthFlow::SignUp),
            "Password should be at least 6 characters."
        );
        assert_eq!(
            AuthError::code("auth/user-not-found").user_message(AuthFlow::SignUp),
            "Something went wrong. Try again."
        );
    }

    #[test]
    fn test_validate_credentials() {
        assert_eq!(validate_credentials("  a@b.co ", "pw").unwrap(), "a@b.co");
        assert_eq!(validate_credentials("   ", "pw"), Err(AuthError::MissingCredentials));
        assert_eq!(validate_credentials("a@b.co", ""), Err(AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_start_screen_follows_session() {
        let gate = gate();
        assert_eq!(gate.start_screen(), StartScreen::SignIn);

        gate.sign_up("neo@matrix.io", "redpill").await.unwrap();
        assert_eq!(gate.start_screen(), StartScreen::Home);

        gate.sign_out().await.unwrap();
        assert_eq!(gate.start_screen(), StartScreen::SignIn);
    }

    #[tokio::test]
    async fn test_sign_up_rules() {
        let gate = gate();

        assert_eq!(
            gate.sign_up("not-an-email", "secret1").await,
            Err(AuthError::Provider(AuthErrorCode::InvalidEmail))
        );
        assert_eq!(
            gate.sign_up("trinity@matrix.io", "12345").await,
            Err(AuthError::Provider(AuthErrorCode::WeakPassword))
        );

        gate.sign_up("trinity@matrix.io", "123456").await.unwrap();
        assert_eq!(
            gate.sign_up("Trinity@matrix.io", "abcdef").await,
            Err(AuthError::Provider(AuthErrorCode::EmailAlreadyInUse))
        );
    }

    #[tokio::test]
    async fn test_sign_in_rules() {
        let gate = gate();
        gate.sign_up("morpheus@matrix.io", "zion123").await.unwrap();
        gate.sign_out().await.unwrap();

        assert_eq!(
            gate.sign_in("smith@matrix.io", "zion123").await,
            Err(AuthError::Provider(AuthErrorCode::UserNotFound))
        );
        assert_eq!(
            gate.sign_in("morpheus@matrix.io", "wrong!").await,
            Err(AuthError::Provider(AuthErrorCode::WrongPassword))
        );
        assert_eq!(gate.sign_in("", "zion123").await, Err(AuthError::MissingCredentials));

        let user = gate.sign_in("  morpheus@matrix.io ", "zion123").await.unwrap();
        assert_eq!(user.email, "morpheus@matrix.io");
    }

    #[tokio::test]
    async fn test_session_changes_are_published() {
        let gate = gate();
        let mut rx = gate.subscribe();
        assert!(rx.borrow().is_none());

        gate.sign_up("oracle@matrix.io", "cookies").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|u| u.email.clone()),
            Some("oracle@matrix.io".to_string())
        );

        gate.sign_out().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
