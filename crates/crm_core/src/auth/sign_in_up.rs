//! Sign-in / sign-up by email, optional invite hash and optional picture.
//!
//! # Responsibility
//! - Validate credentials and resolve the existing user, if any.
//! - Join an existing workspace through its invite hash, or create a new
//!   pending workspace for a first-time user.
//!
//! # Invariants
//! - All row writes of one call run in a single transaction; a rejected
//!   call leaves no user, workspace or membership rows behind.
//! - Only `Active` workspaces accept members through an invite hash.
//! - The profile picture is fetched and stored only once every check has
//!   passed, right before the new user row is written.
//! - Log lines never carry the email or password.

use crate::auth::exception::{AuthException, AuthResult};
use crate::auth::password::{compare_hash, hash_password, is_password_valid};
use crate::config::EnvironmentConfig;
use crate::file::{FileError, FileFolder, FileStorage, FileUploadService};
use crate::model::workspace::{User, Workspace, WorkspaceActivationStatus, WorkspaceMember};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::workspace_repo::{SqliteWorkspaceRepository, WorkspaceRepository};
use log::info;
use rusqlite::Connection;
use uuid::Uuid;

/// Fetches a remote profile picture, e.g. from an SSO provider.
pub trait PictureFetcher {
    fn fetch_picture(&self, url: &str) -> Result<Vec<u8>, FileError>;
}

impl<F> PictureFetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>, FileError>,
{
    fn fetch_picture(&self, url: &str) -> Result<Vec<u8>, FileError> {
        self(url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInUpInput {
    pub email: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub workspace_invite_hash: Option<String>,
    /// Remote picture url.
    pub picture: Option<String>,
    /// Identity already proven by SSO; the password is not checked.
    pub from_sso: bool,
}

struct NewUser {
    email: String,
    first_name: String,
    last_name: String,
    password_hash: Option<String>,
    picture_url: Option<String>,
}

impl NewUser {
    fn into_user(self, default_workspace_id: Uuid, image_path: Option<String>) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            default_avatar_url: image_path,
            can_impersonate: false,
            password_hash: self.password_hash,
            default_workspace_id,
        }
    }
}

pub struct SignInUpService<'a, S, P> {
    conn: &'a Connection,
    uploader: &'a FileUploadService<S>,
    picture_fetcher: P,
    config: &'a EnvironmentConfig,
}

impl<'a, S: FileStorage, P: PictureFetcher> SignInUpService<'a, S, P> {
    pub fn new(
        conn: &'a Connection,
        uploader: &'a FileUploadService<S>,
        picture_fetcher: P,
        config: &'a EnvironmentConfig,
    ) -> Self {
        Self {
            conn,
            uploader,
            picture_fetcher,
            config,
        }
    }

    pub fn sign_in_up(&self, input: SignInUpInput) -> AuthResult<User> {
        let email = input.email.trim().to_string();
        if email.is_empty() {
            return Err(AuthException::invalid_input("Email is required").into());
        }

        let password = input.password.filter(|password| !password.is_empty());
        if let Some(password) = password.as_deref() {
            if !is_password_valid(password) {
                return Err(AuthException::invalid_input("Password too weak").into());
            }
        }
        let password_hash = password.as_deref().map(hash_password);

        let tx = self.conn.unchecked_transaction()?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let workspaces = SqliteWorkspaceRepository::try_new(&tx)?;

        let existing_user = users.find_by_email(&email)?;
        if let Some(user) = existing_user.as_ref() {
            if !input.from_sso {
                let matches = user.password_hash.as_deref().is_some_and(|hash| {
                    compare_hash(password.as_deref().unwrap_or_default(), hash)
                });
                if !matches {
                    return Err(AuthException::forbidden("Wrong password").into());
                }
            }
        }

        let new_user = NewUser {
            email,
            first_name: input.first_name.unwrap_or_default(),
            last_name: input.last_name.unwrap_or_default(),
            password_hash,
            picture_url: input.picture.filter(|url| !url.trim().is_empty()),
        };

        let invite_hash = input
            .workspace_invite_hash
            .as_deref()
            .filter(|hash| !hash.is_empty());
        let user = match (invite_hash, existing_user) {
            (Some(invite_hash), existing_user) => self.sign_in_up_on_existing_workspace(
                &users,
                &workspaces,
                invite_hash,
                existing_user,
                new_user,
            )?,
            (None, None) => self.sign_up_on_new_workspace(&users, &workspaces, new_user)?,
            (None, Some(user)) => user,
        };

        tx.commit()?;
        info!(
            "event=sign_in_up module=auth status=ok user_id={} workspace_id={}",
            user.id, user.default_workspace_id
        );
        Ok(user)
    }

    fn sign_up_on_new_workspace(
        &self,
        users: &impl UserRepository,
        workspaces: &impl WorkspaceRepository,
        new_user: NewUser,
    ) -> AuthResult<User> {
        if self.config.is_sign_up_disabled {
            return Err(AuthException::forbidden("Sign up is disabled").into());
        }

        let workspace = Workspace {
            id: Uuid::new_v4(),
            display_name: String::new(),
            domain_name: String::new(),
            invite_hash: Uuid::new_v4().to_string(),
            activation_status: WorkspaceActivationStatus::PendingCreation,
        };
        workspaces.create_workspace(&workspace)?;

        let user = self.create_user(users, new_user, workspace.id)?;
        info!(
            "event=workspace_create module=auth status=ok workspace_id={} activation_status={}",
            workspace.id,
            workspace.activation_status.as_str()
        );
        Ok(user)
    }

    fn sign_in_up_on_existing_workspace(
        &self,
        users: &impl UserRepository,
        workspaces: &impl WorkspaceRepository,
        invite_hash: &str,
        existing_user: Option<User>,
        new_user: NewUser,
    ) -> AuthResult<User> {
        let workspace = workspaces
            .find_by_invite_hash(invite_hash)?
            .ok_or_else(|| AuthException::forbidden("Invit hash is invalid"))?;

        if workspace.activation_status != WorkspaceActivationStatus::Active {
            return Err(
                AuthException::forbidden("Workspace is not ready to welcome new members").into(),
            );
        }

        if let Some(mut user) = existing_user {
            if users.add_user_to_workspace(user.id, workspace.id)? {
                users.create_workspace_member(&WorkspaceMember::for_user(&user, workspace.id))?;
            }
            users.set_default_workspace(user.id, workspace.id)?;
            user.default_workspace_id = workspace.id;
            return Ok(user);
        }

        let user = self.create_user(users, new_user, workspace.id)?;
        users.create_workspace_member(&WorkspaceMember::for_user(&user, workspace.id))?;
        Ok(user)
    }

    /// Stores the picture, if any, then inserts the user and its membership.
    fn create_user(
        &self,
        users: &impl UserRepository,
        new_user: NewUser,
        workspace_id: Uuid,
    ) -> AuthResult<User> {
        let image_path = match new_user.picture_url.as_deref() {
            Some(url) => Some(self.upload_picture(url)?),
            None => None,
        };
        let user = new_user.into_user(workspace_id, image_path);
        users.create_user(&user)?;
        users.add_user_to_workspace(user.id, workspace_id)?;
        Ok(user)
    }

    fn upload_picture(&self, url: &str) -> AuthResult<String> {
        let bytes = self.picture_fetcher.fetch_picture(url)?;
        let uploaded = self.uploader.upload_image(&bytes, FileFolder::ProfilePicture)?;
        uploaded
            .paths
            .into_iter()
            .next()
            .ok_or_else(|| FileError::Storage("upload returned no path".to_string()).into())
    }
}
