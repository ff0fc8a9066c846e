// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 引擎行为测试
//!
//! 通过公开 API 验证确定性、缓存正确性、归一化稳定性以及各类错误路径。

use proptest::prelude::*;

use vhostgen::{
    body::error_exclusion,
    param::{DEFAULT_CIPHERS, GLOBAL_HEADERS, HSTS_DIRECTIVE},
    ComponentContext, Engine, Exception, HeaderMapping, TlsParameters,
};

fn engine() -> Engine {
    let engine = Engine::new();
    engine.register_header_set("h1", "add_header Server nginx;");
    engine.register_header_set("h2", "add_header Server Apache;");
    engine
        .register_body("b404", "error_page", vec!["404".to_string()])
        .unwrap();
    engine
        .register_body("api", "api_proxy", vec!["api_backend_1".to_string()])
        .unwrap();
    engine
        .register_body("site", "static_site", vec!["/var/www/site".to_string()])
        .unwrap();
    engine
        .register_body("db", "database_proxy", vec!["db_backend_1".to_string()])
        .unwrap();
    engine
}

fn tls() -> TlsParameters {
    TlsParameters::for_domain("example.com").server_tokens(false)
}

#[test]
fn test_determinism_regardless_of_field_order() {
    let engine = engine();
    let a: TlsParameters =
        serde_json::from_str(r#"{"domain":"example.com","hsts":true,"server_tokens":false}"#)
            .unwrap();
    let b: TlsParameters =
        serde_json::from_str(r#"{"server_tokens":false,"domain":"example.com"}"#).unwrap();

    let first = engine.get_or_generate("b404", "h1", &a).unwrap();
    let second = engine.get_or_generate("b404", "h1", &b).unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.cached_len(), 1);
}

#[test]
fn test_cache_hit_equals_fresh_generation() {
    let engine = engine();
    let cached = engine.get_or_generate("api", "h2", &tls()).unwrap();
    let hit = engine.get_or_generate("api", "h2", &tls()).unwrap();
    engine.clear();
    let fresh = engine.get_or_generate("api", "h2", &tls()).unwrap();
    assert_eq!(cached, hit);
    assert_eq!(hit, fresh);
}

#[test]
fn test_distinct_inputs_get_distinct_entries() {
    let engine = engine();
    engine.get_or_generate("b404", "h1", &tls()).unwrap();
    engine.get_or_generate("b404", "h2", &tls()).unwrap();
    engine
        .get_or_generate("b404", "h1", &tls().hsts(false))
        .unwrap();
    assert_eq!(engine.cached_len(), 3);
}

#[test]
fn test_error_exclusion_for_404() {
    let engine = engine();
    let resolved = engine.resolve_body("b404", "h1").unwrap();
    assert_eq!(
        resolved.error_exclusion,
        "error_page 400 401 403 405 500 502 503 =404 /404.html;"
    );
    assert!(!error_exclusion(404).contains(" 404 "));
}

#[test]
fn test_tls_defaults() {
    let engine = engine();
    let fragment = engine.compose(&tls()).unwrap();
    assert!(fragment.block.contains("TLSv1.2 TLSv1.3"));
    assert!(fragment.block.contains(DEFAULT_CIPHERS));
    assert!(fragment.block.contains("ssl_prefer_server_ciphers on;"));
    assert!(fragment.block.contains(HSTS_DIRECTIVE));
}

#[test]
fn test_missing_domain() {
    let engine = engine();
    assert_eq!(
        engine.compose(&TlsParameters::default()),
        Err(Exception::MissingDomain)
    );
}

#[test]
fn test_unknown_body_does_not_mutate() {
    let engine = engine();
    engine.get_or_generate("b404", "h1", &tls()).unwrap();

    assert_eq!(
        engine.resolve_body("nonexistent", "h1"),
        Err(Exception::UnknownBodyId("nonexistent".to_string()))
    );
    assert_eq!(engine.cached_len(), 1);
    assert!(engine.component_type_of("nonexistent").is_none());
    assert!(engine.resolve_body("b404", "h1").is_ok());
}

#[test]
fn test_global_headers_always_present() {
    let engine = engine();
    engine.add_global_headers("add_header X-Frame-Options DENY;");
    for body in ["b404", "api", "site", "db"] {
        for header in ["h1", "h2", "unregistered"] {
            let resolved = engine.resolve_body(body, header).unwrap();
            assert!(resolved.fragment.contains(GLOBAL_HEADERS));
            assert!(resolved.fragment.contains("add_header X-Frame-Options DENY;"));
        }
    }
}

#[test]
fn test_registry_rebinding_is_seen_by_new_keys() {
    let engine = engine();
    let before = engine.get_or_generate("b404", "h1", &tls()).unwrap();

    engine.register_component("error_page", |_: &ComponentContext<'_>| {
        "    # replaced".to_string()
    });
    // 已缓存的键保持不变，新的键使用新的生成器
    assert_eq!(engine.get_or_generate("b404", "h1", &tls()).unwrap(), before);
    let after = engine.get_or_generate("b404", "h2", &tls()).unwrap();
    assert!(after.contains("# replaced"));
}

#[test]
fn test_normalized_header_identifier_as_cache_key() {
    let engine = engine();
    let mapping = HeaderMapping::new()
        .with("status", "HTTP/1.1 404 Not Found")
        .with("Server", "nginx")
        .with("Content-Length", "548");
    let key = engine.register_header_mapping(&mapping).to_string();

    let doc = engine.get_or_generate("b404", &key, &tls()).unwrap();
    assert!(doc.contains("add_header Content-Length 548;"));
}

#[test]
fn test_ids_containing_dashes_get_their_own_documents() {
    let engine = engine();
    engine
        .register_body("a-b", "error_page", vec!["404".to_string()])
        .unwrap();
    engine
        .register_body("a", "api_proxy", vec!["api_backend_a".to_string()])
        .unwrap();

    let first = engine.get_or_generate("a-b", "c", &tls()).unwrap();
    let second = engine.get_or_generate("a", "b-c", &tls()).unwrap();
    assert_ne!(first, second);
    assert!(first.contains("return 404;"));
    assert!(second.contains("proxy_pass http://api_backend_a;"));
    assert_eq!(second, engine.generate("a", "b-c", &tls()).unwrap());
    assert_eq!(engine.cached_len(), 2);
}

fn header_entries() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[A-Za-z-]{1,12}", "[ -~]{0,16}"), 0..8)
        .prop_map(|entries| {
            entries
                .into_iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("status"))
                .collect()
        })
}

proptest! {
    #[test]
    fn prop_status_line_never_changes_key(entries in header_entries(), status in "[ -~]{0,24}") {
        let plain: HeaderMapping = entries.clone().into_iter().collect();
        let mut with_status = HeaderMapping::new().with("status", &status);
        for (k, v) in &entries {
            with_status.push(k, v);
        }
        prop_assert_eq!(vhostgen::normalize(&plain), vhostgen::normalize(&with_status));
    }

    #[test]
    fn prop_normalize_is_stable(entries in header_entries()) {
        let a: HeaderMapping = entries.clone().into_iter().collect();
        let b: HeaderMapping = entries.into_iter().collect();
        prop_assert_eq!(vhostgen::normalize(&a), vhostgen::normalize(&b));
    }

    #[test]
    fn prop_generation_is_deterministic(
        domain in "[a-z]{1,10}\\.(com|org|net)",
        hsts in any::<bool>(),
        tokens in any::<bool>(),
    ) {
        let engine = engine();
        let params = TlsParameters::for_domain(&domain).hsts(hsts).server_tokens(tokens);
        let cached = engine.get_or_generate("site", "h1", &params).unwrap();
        let direct = engine.generate("site", "h1", &params).unwrap();
        prop_assert_eq!(cached, direct);
    }
}
