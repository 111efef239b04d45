use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use url::Url;

use crate::protocol::RtmpStatus;
use crate::protocol::status::codes;
use crate::Error;

/// Connect attempts per `connect` call: plain, `authmod=adobe`, challenge answer
pub const MAX_CONNECT_ATTEMPTS: u32 = 3;

/// The URL to retry `connect` with after `error`, if the server asked for
/// Adobe authentication and `url` carries credentials.
///
/// A rejection naming `authmod=adobe` gets the user appended. The second
/// rejection carries `reason=needauth` with a salt and a challenge, which is
/// answered with a salted MD5 response.
pub fn retry_url(url: &Url, error: &Error) -> Option<Url> {
    let Error::CommandFailed { status, .. } = error else {
        return None;
    };
    let status = status.as_ref().and_then(RtmpStatus::from_value)?;
    if status.code != codes::CONNECT_REJECTED {
        return None;
    }
    let challenge = format!("{:08x}", rand::random::<u32>());
    next_url(url, &status.description, &challenge)
}

fn next_url(url: &Url, description: &str, client_challenge: &str) -> Option<Url> {
    let user = url.username();
    let password = url.password().unwrap_or_default();
    if user.is_empty() || password.is_empty() {
        return None;
    }

    let mut query = url.query().unwrap_or_default().to_string();
    if description.contains("reason=nosuchuser") || description.contains("reason=authfailed") {
        return None;
    } else if description.contains("reason=needauth") {
        let (_, params) = description.split_once('?')?;
        let params = raw_pairs(params);
        let salt = params.get("salt")?;
        let server_challenge = params.get("opaque").or_else(|| params.get("challenge"));
        if let Some(opaque) = params.get("opaque") {
            query.push_str(&format!("&opaque={}", opaque));
        }
        let response = adobe_response(user, password, salt, server_challenge.copied(), client_challenge);
        query.push_str(&format!("&challenge={}&response={}", client_challenge, response));
    } else if description.contains("authmod=adobe") {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!("authmod=adobe&user={}", user));
    } else {
        return None;
    }

    let mut next = url.clone();
    next.set_query(Some(&query));
    Some(next)
}

/// Query pairs as written; salts and challenges are base64 and may hold '+'
fn raw_pairs(query: &str) -> HashMap<&str, &str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect()
}

/// `base64(md5(base64(md5(user + salt + password)) + server + client))`
pub fn adobe_response(
    user: &str,
    password: &str,
    salt: &str,
    server_challenge: Option<&str>,
    client_challenge: &str,
) -> String {
    let mut response = md5_base64(&format!("{}{}{}", user, salt, password));
    if let Some(challenge) = server_challenge {
        response.push_str(challenge);
    }
    response.push_str(client_challenge);
    md5_base64(&response)
}

fn md5_base64(message: &str) -> String {
    STANDARD.encode(Md5::digest(message.as_bytes()))
}
