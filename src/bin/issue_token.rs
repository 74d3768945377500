#[path = "../auth.rs"]
mod auth;

// Prints a fresh access token and the hash to store in session_token.session_token_hash.
fn main() {
    let token = auth::generate_access_token();
    println!("token: {token}");
    println!("hash:  {}", auth::hash_access_token(&token));
}
