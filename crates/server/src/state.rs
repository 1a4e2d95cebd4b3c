use std::sync::Arc;

use configs::AppConfig;
use service::{
    admin::AdminService,
    auth::{AuthConfig, AuthService},
    files::FileService,
    invites::{InviteNotifier, InviteService, LogNotifier},
    messages::MessageService,
    storage::Stores,
    support::SupportService,
};

/// Everything a handler can reach. Services own their store handles; the
/// state itself holds no collection data.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub files: Arc<FileService>,
    pub invites: Arc<InviteService>,
    pub support: Arc<SupportService>,
    pub messages: Arc<MessageService>,
    pub admin: Arc<AdminService>,
    pub secure_cookie: bool,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(stores: Stores, cfg: &AppConfig) -> Self {
        Self::with_notifier(stores, cfg, Arc::new(LogNotifier))
    }

    pub fn with_notifier(stores: Stores, cfg: &AppConfig, notifier: Arc<dyn InviteNotifier>) -> Self {
        let auth = Arc::new(AuthService::new(stores.users.clone(), AuthConfig::from(&cfg.auth)));
        let files = Arc::new(FileService::new(
            stores.files.clone(),
            stores.users.clone(),
            &cfg.storage.upload_dir,
            cfg.max_upload_bytes(),
        ));
        let invites = Arc::new(InviteService::new(stores.invitations.clone(), notifier, &cfg.server.public_base_url));
        let support = Arc::new(SupportService::new(stores.tickets.clone()));
        let messages = Arc::new(MessageService::new(stores.messages.clone(), stores.users.clone()));
        let admin = Arc::new(AdminService::new(stores, files.clone(), support.clone(), &cfg.storage.data_dir));
        Self {
            auth,
            files,
            invites,
            support,
            messages,
            admin,
            secure_cookie: cfg.auth.secure_cookie,
            max_upload_bytes: cfg.max_upload_bytes(),
        }
    }
}
