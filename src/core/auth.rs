use crate::core::{AppError, AppState};
use crate::entities::{Member, Membership, MembershipRole};
use axum::extract::State;
use axum::{
    Error,
    body::Body,
    extract::Request,
    http,
    http::{HeaderMap, Response},
    middleware::Next,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub member_id: i64,
    pub phone: String,
}

/// Identity of the caller on routes where logging in is optional.
#[derive(Debug, Clone, Default)]
pub struct CallerIdentity(pub Option<Member>);

#[instrument(skip(phone, secret))]
pub fn encode_jwt(member_id: i64, phone: String, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for member");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        member_id,
        phone,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data: TokenData<Claims>| {
        debug!("JWT token decoded for member {}", data.claims.member_id);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Resolves the bearer token in `headers`, if any, to a stored member.
async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<Option<Member>, AppError> {
    let Some(header) = headers.get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|_| {
        warn!("Invalid authorization header format");
        AppError::forbidden("Empty header is not allowed")
    })?;

    let mut parts = header.split_whitespace();
    let token = match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => token,
        _ => {
            warn!("Authorization header is not a bearer token");
            return Err(AppError::unauthorized("Unable to decode token"));
        }
    };

    let token_data = decode_jwt(token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    // Fetch the member details from the database
    match state.memberships.member(token_data.claims.member_id).await? {
        Some(member) => Ok(Some(member)),
        None => {
            warn!("Member not found in database: {}", token_data.claims.member_id);
            Err(AppError::unauthorized("You are not an authorized member"))
        }
    }
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let Some(current_member) = resolve_caller(&state, req.headers()).await? else {
        warn!("Missing authorization header");
        return Err(AppError::forbidden("Please add the JWT token to the header"));
    };

    info!("Member authenticated: {}", current_member.id);
    req.extensions_mut().insert(current_member);
    Ok(next.run(req).await)
}

/// Like [`authentication_middleware`] but lets anonymous callers through; inserts a
/// [`CallerIdentity`] either way. A token that is present but invalid is still rejected.
#[instrument(skip(state, req, next))]
pub async fn optional_authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let caller = resolve_caller(&state, req.headers()).await?;
    debug!("Caller identified: {}", caller.is_some());
    req.extensions_mut().insert(CallerIdentity(caller));
    Ok(next.run(req).await)
}

/// Middleware che verifica che il member corrente abbia aderito all'organizzazione
/// Estrae org_id dal path, verifica la membership e la inserisce nell'Extension
#[instrument(skip(state, req, next))]
pub async fn organization_membership_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running organization membership middleware");
    // 1. Member corrente dall'Extension (inserito da authentication_middleware)
    let current_member = req
        .extensions()
        .get::<Member>()
        .ok_or_else(|| {
            warn!("Member not found in request extensions");
            AppError::unauthorized("Member not authenticated")
        })?
        .clone();

    // 2. org_id: primo segmento numerico del path
    let organization_id: i64 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i64>().ok())
        .ok_or_else(|| {
            warn!("Organization ID not found in path: {}", req.uri().path());
            AppError::bad_request("Organization ID not found in path")
        })?;

    // 3. membership approvata
    let membership = state
        .memberships
        .find_membership(current_member.id, organization_id)
        .await?
        .filter(|m| m.joined)
        .ok_or_else(|| {
            warn!(
                "Member {} is not a member of organization {}",
                current_member.id, organization_id
            );
            AppError::forbidden("You are not a member of this organization")
        })?;

    debug!("Member {} verified in organization {}", current_member.id, organization_id);

    // 4. Inserire la membership nell'Extension per gli handler
    req.extensions_mut().insert(membership);

    Ok(next.run(req).await)
}

/// Verifica che la membership abbia uno dei ruoli richiesti
#[instrument(skip(membership))]
pub fn require_role(
    membership: &Membership,
    allowed_roles: &[MembershipRole],
) -> Result<(), AppError> {
    if !allowed_roles.contains(&membership.role) {
        warn!(
            "Member {} has insufficient role {:?}, required one of: {:?}",
            membership.member_id, membership.role, allowed_roles
        );
        return Err(AppError::forbidden("Insufficient role").with_details(format!(
            "This action requires one of the following roles: {:?}",
            allowed_roles
        )));
    }

    debug!("Role check passed for member {}", membership.member_id);
    Ok(())
}
