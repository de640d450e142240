use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::dto::auth_dto::{LoginPayload, LoginResponse, RegisterPayload};
use crate::error::ApiError;
use crate::models::{Credential, Identity, Role};
use crate::services::api_client::{ApiRequest, Gateway};
use crate::services::notification_service::NotificationService;
use crate::services::session_storage::{DurableStorage, StorageEvent, TOKEN_KEY, USER_KEY};
use crate::services::Subscription;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Durable storage has not been read yet.
    Unresolved,
    Anonymous,
    Authenticated {
        identity: Identity,
        credential: Credential,
    },
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity, .. } => Some(identity),
            SessionState::Unresolved | SessionState::Anonymous => None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            SessionState::Authenticated { credential, .. } => Some(credential),
            SessionState::Unresolved | SessionState::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Holds who is signed in and keeps durable storage in step with it.
pub struct SessionStore {
    gateway: Arc<dyn Gateway>,
    storage: Arc<dyn DurableStorage>,
    notifications: NotificationService,
    state: watch::Sender<SessionState>,
    bootstrapped: AtomicBool,
}

impl SessionStore {
    /// Channel the store publishes its state on. The receiving half is handed
    /// to the gateway before the store exists so requests can carry the
    /// bearer token.
    pub fn channel() -> (watch::Sender<SessionState>, watch::Receiver<SessionState>) {
        watch::channel(SessionState::Unresolved)
    }

    pub fn new(
        gateway: Arc<dyn Gateway>,
        storage: Arc<dyn DurableStorage>,
        notifications: NotificationService,
        state: watch::Sender<SessionState>,
    ) -> Self {
        Self {
            gateway,
            storage,
            notifications,
            state,
            bootstrapped: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Restores the persisted session. Only the first call reads storage.
    pub fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return self.state();
        }

        let restored = self.restore();
        match &restored {
            SessionState::Authenticated { identity, .. } => {
                info!(user_id = %identity.id, role = %identity.role, "Session restored");
            }
            _ => info!("No stored session"),
        }
        self.state.send_replace(restored.clone());
        restored
    }

    fn restore(&self) -> SessionState {
        let (Some(user), Some(token)) = (self.storage.get(USER_KEY), self.storage.get(TOKEN_KEY))
        else {
            return SessionState::Anonymous;
        };

        let credential = Credential::new(token);
        match serde_json::from_str::<Identity>(&user) {
            Ok(identity) if !credential.is_blank() => SessionState::Authenticated {
                identity,
                credential,
            },
            Ok(_) => {
                warn!("Stored credential is blank, clearing session storage");
                self.clear_storage();
                SessionState::Anonymous
            }
            Err(e) => {
                warn!("Error loading stored session: {}", e);
                self.clear_storage();
                SessionState::Anonymous
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let payload = LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .gateway
            .call(ApiRequest::post_json(LOGIN_PATH, &payload)?)
            .await?;
        let auth: LoginResponse = response.into_json()?;

        let identity = auth.identity(email);
        let credential = Credential::new(auth.access_token.clone());
        self.persist(&identity, &credential);

        info!(user_id = %identity.id, role = %identity.role, "Logged in");
        self.state.send_replace(SessionState::Authenticated {
            identity: identity.clone(),
            credential,
        });
        self.bootstrapped.store(true, Ordering::SeqCst);

        self.notifications.success(
            "Inicio de sesión exitoso",
            format!("¡Bienvenido de vuelta, {}!", auth.username),
        );
        Ok(identity)
    }

    /// Creates an account without signing in. Returns the server's
    /// confirmation text.
    pub async fn register(&self, payload: &RegisterPayload) -> Result<String, ApiError> {
        let response = self
            .gateway
            .call(ApiRequest::post_json(REGISTER_PATH, payload)?)
            .await?;
        let message = response.into_text();
        let message = if message.trim().is_empty() {
            "¡Tu cuenta ha sido creada! Ahora puedes iniciar sesión.".to_string()
        } else {
            message
        };

        info!(email = %payload.email, role = %payload.role, "Account registered");
        self.notifications.success("Registro exitoso", message.clone());
        Ok(message)
    }

    pub fn logout(&self) {
        self.state.send_replace(SessionState::Anonymous);
        self.bootstrapped.store(true, Ordering::SeqCst);
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove {} from session storage: {}", key, e);
            }
        }
        info!("Logged out");
        self.notifications
            .info("Sesión cerrada", "Has cerrado tu sesión exitosamente.");
    }

    /// Reacts to a storage change made by another instance. Returns `true`
    /// when it ended this session.
    pub fn handle_storage_event(&self, event: &StorageEvent) -> bool {
        if event.key != TOKEN_KEY || event.new_value.is_some() {
            return false;
        }
        self.end_if_authenticated()
    }

    fn end_if_authenticated(&self) -> bool {
        let ended = self.state.send_if_modified(|state| {
            if state.is_authenticated() {
                *state = SessionState::Anonymous;
                true
            } else {
                false
            }
        });
        if ended {
            info!("Token removed by another instance, closing session");
            self.notifications.info(
                "Sesión cerrada",
                "Tu sesión ha sido cerrada desde otra pestaña o ventana.",
            );
        }
        ended
    }

    /// Listens for the credential disappearing from durable storage.
    pub fn watch_storage(self: &Arc<Self>) -> Subscription {
        let store = Arc::clone(self);
        let mut events = self.storage.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        store.handle_storage_event(&event);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Storage listener lagged, re-checking credential");
                        if store.storage.get(TOKEN_KEY).is_none() {
                            store.end_if_authenticated();
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Subscription::new(handle)
    }

    fn persist(&self, identity: &Identity, credential: &Credential) {
        let user = match serde_json::to_string(identity) {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed to serialize identity: {}", e);
                return;
            }
        };
        if let Err(e) = self
            .storage
            .set(USER_KEY, &user)
            .and_then(|_| self.storage.set(TOKEN_KEY, credential.expose()))
        {
            warn!("Failed to persist session: {}", e);
        }
    }

    fn clear_storage(&self) {
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear session storage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::{ApiResponse, MockGateway};
    use crate::services::session_storage::MemoryStorage;
    use reqwest::Method;
    use serde_json::json;

    fn store_with(gateway: MockGateway, storage: MemoryStorage) -> SessionStore {
        let (tx, _rx) = SessionStore::channel();
        SessionStore::new(
            Arc::new(gateway),
            Arc::new(storage),
            NotificationService::default(),
            tx,
        )
    }

    #[test]
    fn bootstrap_without_storage_is_anonymous() {
        let store = store_with(MockGateway::new(), MemoryStorage::new());
        assert_eq!(store.state(), SessionState::Unresolved);
        assert_eq!(store.bootstrap(), SessionState::Anonymous);
    }

    #[test]
    fn bootstrap_restores_stored_session() {
        let storage = MemoryStorage::new();
        storage
            .set(
                USER_KEY,
                r#"{"id":"4","name":"Rosa","email":"rosa@sodimac.pe","role":"hr"}"#,
            )
            .unwrap();
        storage.set(TOKEN_KEY, "tok-4").unwrap();

        let store = store_with(MockGateway::new(), storage);
        let state = store.bootstrap();
        assert_eq!(state.role(), Some(Role::Hr));
        assert_eq!(state.credential().map(|c| c.expose()), Some("tok-4"));
    }

    #[test]
    fn malformed_identity_clears_storage() {
        let storage = MemoryStorage::new();
        storage.set(USER_KEY, "{not json").unwrap();
        storage.set(TOKEN_KEY, "tok").unwrap();

        let store = store_with(MockGateway::new(), storage.clone());
        assert_eq!(store.bootstrap(), SessionState::Anonymous);
        assert_eq!(storage.get(USER_KEY), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn second_bootstrap_does_not_reread_storage() {
        let storage = MemoryStorage::new();
        let store = store_with(MockGateway::new(), storage.clone());
        store.bootstrap();

        storage
            .set(USER_KEY, r#"{"id":1,"name":"x","email":"x@y.z","role":"candidate"}"#)
            .unwrap();
        storage.set(TOKEN_KEY, "late").unwrap();
        assert_eq!(store.bootstrap(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn login_persists_identity_and_token() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .withf(|req| req.method == Method::POST && req.path == LOGIN_PATH)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::Json(json!({
                    "accessToken": "jwt-1",
                    "userId": 12,
                    "username": "Carlos",
                    "role": "manager"
                })))
            });
        let storage = MemoryStorage::new();
        let store = store_with(gateway, storage.clone());
        store.bootstrap();

        let identity = store.login("carlos@sodimac.pe", "secreto").await.unwrap();
        assert_eq!(identity.role, Role::Manager);
        assert_eq!(identity.email, "carlos@sodimac.pe");
        assert!(store.state().is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("jwt-1"));
        let stored: Identity = serde_json::from_str(&storage.get(USER_KEY).unwrap()).unwrap();
        assert_eq!(stored, identity);
    }

    #[tokio::test]
    async fn failed_login_propagates_and_keeps_state() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .returning(|_| Err(ApiError::new("Credenciales inválidas")));
        let storage = MemoryStorage::new();
        let store = store_with(gateway, storage.clone());
        store.bootstrap();

        let err = store.login("a@b.c", "bad").await.unwrap_err();
        assert_eq!(err.message, "Credenciales inválidas");
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn register_returns_confirmation_without_signing_in() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_call()
            .withf(|req| req.path == REGISTER_PATH)
            .returning(|_| Ok(ApiResponse::Text("Usuario registrado exitosamente".into())));
        let store = store_with(gateway, MemoryStorage::new());
        store.bootstrap();

        let payload = RegisterPayload {
            name: "Luis".into(),
            email: "luis@example.com".into(),
            password: "secreto".into(),
            role: Role::Candidate,
            phone: None,
            department: None,
        };
        let message = store.register(&payload).await.unwrap();
        assert_eq!(message, "Usuario registrado exitosamente");
        assert!(!store.state().is_authenticated());
    }

    #[tokio::test]
    async fn logout_clears_memory_and_storage() {
        let mut gateway = MockGateway::new();
        gateway.expect_call().returning(|_| {
            Ok(ApiResponse::Json(json!({
                "accessToken": "jwt-2",
                "userId": 3,
                "username": "Ana",
                "role": "candidate"
            })))
        });
        let storage = MemoryStorage::new();
        let store = store_with(gateway, storage.clone());
        store.login("ana@example.com", "secreto").await.unwrap();

        store.logout();
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(storage.get(USER_KEY), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[test]
    fn unrelated_storage_events_are_ignored() {
        let store = store_with(MockGateway::new(), MemoryStorage::new());
        let event = StorageEvent {
            key: USER_KEY.to_string(),
            new_value: None,
        };
        assert!(!store.handle_storage_event(&event));
    }
}
