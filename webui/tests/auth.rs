// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{ADMIN_NAME, ADMIN_PASSWORD, TestHarness, get_page, location, login};

#[actix_web::test]
async fn anonymous_requests_are_sent_to_login() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;

    let req = test::TestRequest::get().uri("/roles/new").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login?return_path=%2Froles%2Fnew");

    let req = test::TestRequest::post()
        .uri("/roles")
        .set_form([("name", "web"), ("env_run_lists[_default]", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(harness.memory.role_count(), 0);
}

#[actix_web::test]
async fn login_page_renders_form() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;

    let req = test::TestRequest::get()
        .uri("/login?return_path=%2Froles%2Fnew")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("name=\"return_path\""));
}

#[actix_web::test]
async fn wrong_password_is_rejected() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("name", ADMIN_NAME), ("password", "nope")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.response().cookies().next().is_none());
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Invalid username or password"));

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("name", "mallory"), ("password", ADMIN_PASSWORD)])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_honors_local_return_path_only() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("name", ADMIN_NAME),
            ("password", ADMIN_PASSWORD),
            ("return_path", "/roles/new"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/roles/new");
    let cookie = resp
        .response()
        .cookies()
        .next()
        .expect("session cookie")
        .into_owned();
    assert_eq!(cookie.http_only(), Some(true));

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("name", ADMIN_NAME),
            ("password", ADMIN_PASSWORD),
            ("return_path", "https://evil.example/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/roles");
}

#[actix_web::test]
async fn logout_ends_the_session() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;
    let cookie = login(&app, ADMIN_NAME, ADMIN_PASSWORD).await;

    let (status, _) = get_page(&app, "/roles", &cookie).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let (status, _) = get_page(&app, "/roles", &cookie).await;
    assert_eq!(status, StatusCode::FOUND);
}

#[actix_web::test]
async fn root_redirects_and_unknown_paths_are_not_found() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.build_app()).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/roles");

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
