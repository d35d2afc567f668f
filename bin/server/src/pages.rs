//! Static pages.

use axum::response::Html;

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Sign in - Mesika</title>
    <style>
        body {
            font-family: system-ui, sans-serif;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
            background: #f5f5f5;
        }
        main {
            background: #fff;
            padding: 2.5rem 3rem;
            border-radius: 8px;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.15);
            text-align: center;
        }
        a.sign-in {
            display: inline-block;
            margin-top: 1rem;
            padding: 0.75rem 1.5rem;
            border-radius: 4px;
            background: #1a73e8;
            color: #fff;
            text-decoration: none;
        }
    </style>
</head>
<body>
    <main>
        <h1>Mesika</h1>
        <p>Sign in with your mesika.org Google account.</p>
        <a class="sign-in" href="/api/auth/sso">Sign in with Google</a>
    </main>
</body>
</html>
"#;

/// Renders the login entry page.
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}
