// live_backend.rs
// Smoke test against a real UniNexus backend.

// This test is designed to verify:
// 1. That login returns a usable token pair
// 2. That an expired access token is transparently refreshed on the next call

#[tokio::test]
#[ignore] // This test requires a running backend
async fn test_session_refresh_against_live_backend() {
    // This test demonstrates the full session lifecycle against a real
    // deployment. It would:
    // 1. Register a throwaway account
    // 2. Log in and capture the token pair
    // 3. Wait for (or force) access token expiry
    // 4. Issue an authenticated request and verify it succeeds after a
    //    single refresh round trip

    println!("Live session refresh test");
    println!("-------------------------");
    println!("Set UNINEXUS_BASE_URL to the backend under test before running.");
    println!("Steps in this test:");
    println!("1. POST /api/auth/register creates the throwaway account");
    println!("2. POST /api/auth/login returns token and refreshToken");
    println!("3. GET /api/users/profile with a stale token triggers one refresh");
    println!("4. The retried profile request succeeds with the new token");

    println!("\nTo test manually:");
    println!("1. Run the CLI with --token-file pointed at a scratch file");
    println!("2. Log in, then shorten the access token TTL server-side");
    println!("3. Browse events after expiry and confirm no re-login prompt appears");

    // Documentation only; the mock-server suites cover the behavior.
    assert!(true);
}
