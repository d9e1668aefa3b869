use crate::middlewares::auth::JwtService;
use crate::models::refresh_token::RefreshToken;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
use anyhow::{anyhow, Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub struct AuthService {
    mongo: Database,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(mongo: Database, jwt_service: JwtService) -> Self {
        let access_token_ttl_seconds = std::env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600); // Default: 1 hour

        let refresh_token_ttl_seconds = std::env::var("JWT_REFRESH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(2592000); // Default: 30 days

        Self {
            mongo,
            jwt_service,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
        }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, DEFAULT_COST).context("Failed to hash password")
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).context("Failed to verify password")
    }

    /// Register a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
        let users_collection = self.mongo.collection::<User>("users");
        let username = req.username.trim().to_lowercase();

        let existing_user = users_collection
            .find_one(doc! { "username": &username })
            .await
            .context("Failed to check existing user")?;

        if existing_user.is_some() {
            return Err(anyhow!("User with this username already exists"));
        }

        let password_hash = self.hash_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: None, // MongoDB will generate
            username,
            password_hash,
            created_at: now,
            last_login_at: None,
        };

        let insert_result = users_collection
            .insert_one(&user)
            .await
            .context("Failed to insert user")?;

        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;

        let access_token = self.generate_access_token(&user_id)?;
        let refresh_token = self.create_refresh_token(&user_id).await?;

        let mut user_with_id = user;
        user_with_id.id = Some(user_id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: UserProfile::from(user_with_id),
        })
    }

    /// Login with username and password. Unknown users and wrong passwords
    /// produce the same message.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let users_collection = self.mongo.collection::<User>("users");
        let username = req.username.trim().to_lowercase();

        let user = users_collection
            .find_one(doc! { "username": &username })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("Invalid username or password"))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(username = %username, "Failed login attempt: invalid password");
            return Err(anyhow!("Invalid username or password"));
        }

        let user_id = user.id.ok_or_else(|| anyhow!("User ID not found"))?;

        users_collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": { "lastLoginAt": mongodb::bson::DateTime::now() } },
            )
            .await
            .context("Failed to update last login timestamp")?;

        let access_token = self.generate_access_token(&user_id)?;
        let refresh_token = self.create_refresh_token(&user_id).await?;

        tracing::info!(user_id = %user_id.to_hex(), username = %username, "Successful login");

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: UserProfile::from(user),
        })
    }

    /// Generate JWT access token
    fn generate_access_token(&self, user_id: &ObjectId) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_ttl_seconds);

        let claims = crate::middlewares::auth::JwtClaims {
            sub: user_id.to_hex(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| anyhow!("Failed to generate token: {}", e))
    }

    /// Create refresh token and store its hash in MongoDB
    async fn create_refresh_token(&self, user_id: &ObjectId) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let token_hash = self.hash_token(&token);

        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.refresh_token_ttl_seconds);

        let refresh_token = RefreshToken {
            id: None,
            user_id: *user_id,
            token_hash,
            created_at: now,
            expires_at,
            last_used_at: now,
            revoked: false,
        };

        let collection = self.mongo.collection::<RefreshToken>("refresh_tokens");
        collection
            .insert_one(&refresh_token)
            .await
            .context("Failed to insert refresh token")?;

        Ok(token)
    }

    /// Hash a token using SHA-256
    fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String> {
        let token_hash = self.hash_token(refresh_token);
        let collection = self.mongo.collection::<RefreshToken>("refresh_tokens");

        let token_doc = collection
            .find_one(doc! { "token_hash": &token_hash, "revoked": false })
            .await
            .context("Failed to query refresh token")?
            .ok_or_else(|| anyhow!("Invalid or expired refresh token"))?;

        if token_doc.expires_at < Utc::now() {
            return Err(anyhow!("Refresh token has expired"));
        }

        collection
            .update_one(
                doc! { "token_hash": &token_hash },
                doc! { "$set": { "lastUsedAt": mongodb::bson::DateTime::now() } },
            )
            .await
            .context("Failed to update refresh token")?;

        self.generate_access_token(&token_doc.user_id)
    }

    /// Logout user by revoking refresh token
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let token_hash = self.hash_token(refresh_token);
        let collection = self.mongo.collection::<RefreshToken>("refresh_tokens");

        let result = collection
            .update_one(
                doc! { "token_hash": &token_hash, "revoked": false },
                doc! { "$set": { "revoked": true } },
            )
            .await
            .context("Failed to revoke refresh token")?;

        if result.matched_count == 0 {
            return Err(anyhow!("Invalid or already revoked refresh token"));
        }

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        let object_id = ObjectId::parse_str(user_id).context("Invalid user ID format")?;

        let collection = self.mongo.collection::<User>("users");
        collection
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("User not found"))
    }
}
