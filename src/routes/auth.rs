use crate::{
    auth::{hash_password, verify_password, LoginRequest, LoginResponse, RegisterRequest},
    context::AppContext,
    error::AppError,
    models::{NewUser, User},
    serialize::USER_VIEW,
    store,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

const EMAIL_IN_USE: &str = "Email address already in use";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register a new user
///
/// Validates the payload, rejects an email that is already registered with
/// `409 Conflict`, stores the user with a bcrypt-hashed password and returns it
/// (without the password) as `201 Created`.
#[post("/register/")]
pub async fn register(
    ctx: web::Data<AppContext>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        email,
        password,
        name,
    } = register_data.into_inner();

    if User::find_by_email(ctx.store(), &email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_IN_USE.into()));
    }

    let new_user = NewUser {
        name,
        email,
        password: hash_password(&password, ctx.bcrypt_cost)?,
        is_admin: None,
    };

    // A concurrent registration can still win the race; the unique
    // constraint reports it as a conflict.
    let user = store::insert(ctx.store(), &new_user)
        .await
        .map_err(|err| match err {
            AppError::Conflict(_) => AppError::Conflict(EMAIL_IN_USE.into()),
            other => other,
        })?;

    log::info!("Registered user {} ({})", user.id, user.email);
    Ok(HttpResponse::Created().json(USER_VIEW.dump(&user)))
}

/// Login user
///
/// Answers with the same `401` whether the email is unknown or the password is wrong.
#[post("/login/")]
pub async fn login(
    ctx: web::Data<AppContext>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = match User::find_by_email(ctx.store(), &login_data.email).await? {
        Some(user) if verify_password(&login_data.password, &user.password)? => user,
        _ => {
            log::warn!("Failed login attempt for {}", login_data.email);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    let token = ctx.tokens.generate_token(user.id)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        email: user.email,
        token,
        is_admin: user.is_admin,
    }))
}
