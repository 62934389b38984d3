use crate::database::{keys, JsonStore};
use crate::dto::auth_dto::{
    CreateStudentPayload, InitAdminPayload, SetupStatus, StudentSummary, UpdateUserPayload,
};
use crate::error::{Error, Result};
use crate::models::user::{normalize_role, User, UserList, ROLE_SUPER_ADMIN};
use crate::utils::crypto::{
    check_password_strength, hash_password, is_legacy_hash, verify_password,
};
use crate::utils::time::{now, to_rfc3339};

#[derive(Clone)]
pub struct UserService {
    store: JsonStore,
}

impl UserService {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<UserList> {
        Ok(self
            .store
            .get_json::<UserList>(keys::USERS)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, list: &UserList) -> Result<()> {
        self.store.set_json(keys::USERS, list).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let mut list = self.load().await?;
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());
        let user = list.find_by_email(email).ok_or_else(invalid)?;
        if !verify_password(password, &user.password) {
            tracing::warn!(email, "failed login attempt");
            return Err(invalid());
        }
        let user = user.clone();
        if is_legacy_hash(&user.password) {
            self.upgrade_hash(&mut list, user.id, password).await;
        }
        Ok(user)
    }

    /// Swaps a verified bcrypt hash for argon2. Failure leaves the old hash in place.
    async fn upgrade_hash(&self, list: &mut UserList, id: u64, password: &str) {
        let hashed = match hash_password(password) {
            Ok(hashed) => hashed,
            Err(e) => {
                tracing::warn!(user_id = id, error = %e, "password rehash failed");
                return;
            }
        };
        let Some(stored) = list.users.iter_mut().find(|u| u.id == id) else {
            return;
        };
        stored.password = hashed;
        match self.save(list).await {
            Ok(()) => tracing::info!(user_id = id, "legacy password hash upgraded"),
            Err(e) => tracing::warn!(user_id = id, error = %e, "password rehash not saved"),
        }
    }

    pub async fn setup_status(&self) -> Result<SetupStatus> {
        let count = self.load().await?.users.len();
        Ok(SetupStatus {
            needs_setup: count == 0,
            user_count: count,
        })
    }

    /// Creates the first super-admin; refused once any account exists.
    pub async fn init_admin(&self, payload: InitAdminPayload) -> Result<User> {
        let list = self.load().await?;
        if !list.users.is_empty() {
            return Err(Error::BadRequest(
                "Admin already initialized. Users exist.".to_string(),
            ));
        }
        check_password_strength(&payload.password)?;

        let admin = User {
            id: 1,
            email: payload.email,
            name: payload.name,
            student_id: String::new(),
            password: hash_password(&payload.password)?,
            role: Some(ROLE_SUPER_ADMIN.to_string()),
            is_admin: true,
            profile_id: None,
            created_at: Some(to_rfc3339(now())),
        };
        self.save(&UserList {
            users: vec![admin.clone()],
        })
        .await?;
        tracing::info!(email = %admin.email, "initial admin created");
        Ok(admin)
    }

    pub async fn create_student(&self, payload: CreateStudentPayload) -> Result<User> {
        check_password_strength(&payload.password)?;
        let mut list = self.load().await?;
        if list.find_by_email(&payload.email).is_some() {
            return Err(Error::BadRequest(
                "A user with this email already exists".to_string(),
            ));
        }

        let mut user = User {
            id: list.next_id(),
            email: payload.email,
            name: payload.name,
            student_id: payload.student_id.unwrap_or_default(),
            password: hash_password(&payload.password)?,
            role: None,
            is_admin: false,
            profile_id: None,
            created_at: Some(to_rfc3339(now())),
        };
        user.set_role(payload.role.as_deref().unwrap_or_default());

        list.users.push(user.clone());
        self.save(&list).await?;
        tracing::info!(user_id = user.id, role = user.effective_role(), "user created");
        Ok(user)
    }

    pub async fn update(&self, id: u64, payload: UpdateUserPayload) -> Result<User> {
        let mut list = self.load().await?;
        let user = list
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
            check_password_strength(&password)?;
            user.password = hash_password(&password)?;
        }
        if let Some(name) = payload.name.filter(|n| !n.is_empty()) {
            user.name = name;
        }
        if let Some(student_id) = payload.student_id {
            user.student_id = student_id;
        }
        // An explicit role wins over the legacy boolean.
        if let Some(role) = payload.role {
            user.set_role(normalize_role(&role));
        } else if let Some(is_admin) = payload.is_admin {
            user.set_role(if is_admin { ROLE_SUPER_ADMIN } else { "" });
        }

        let updated = user.clone();
        self.save(&list).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: u64, acting_user_id: u64) -> Result<()> {
        if id == acting_user_id {
            return Err(Error::BadRequest(
                "Cannot delete your own account".to_string(),
            ));
        }
        let mut list = self.load().await?;
        let before = list.users.len();
        list.users.retain(|u| u.id != id);
        if list.users.len() == before {
            return Err(Error::NotFound("User not found".to_string()));
        }
        self.save(&list).await?;
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn students(&self) -> Result<Vec<StudentSummary>> {
        Ok(self
            .load()
            .await?
            .students()
            .map(|u| StudentSummary {
                username: u.username(),
                email: u.email.clone(),
                name: u.display_name(),
            })
            .collect())
    }
}
