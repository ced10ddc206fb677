//! Runs the rendered browser validator inside QuickJS.
//!
//! `tests/fixtures/page.js` stands in for the browser page, so the guard's
//! own control flow decides what ends up visible. Each test drives the page
//! through its lifecycle hooks and inspects the resulting DOM.

use embed_guard::client::render_script;
use embed_guard::{evaluate, AllowedOrigins, EmbeddingContext, Origin};
use rquickjs::{Context, Ctx, FromJs, Runtime, Value};

const PAGE: &str = include_str!("fixtures/page.js");

fn run<'js, T: FromJs<'js>>(ctx: &Ctx<'js>, source: &str) -> T {
    match ctx.eval::<T, _>(source) {
        Ok(value) => value,
        Err(err) => panic!("script failed: {err}: {:?}", ctx.catch()),
    }
}

fn text(ctx: &Ctx<'_>, expr: &str) -> String {
    run(ctx, expr)
}

fn flag(ctx: &Ctx<'_>, expr: &str) -> bool {
    run(ctx, expr)
}

/// Loads a page with two report sections, `report` (no inline display) and
/// `chart` (inline `display: flex`), frames it as `frame` describes and
/// evaluates the guard rendered for `allowed`.
fn with_page(allowed: &[&str], frame: &str, test: impl FnOnce(&Ctx<'_>)) {
    let allowed = AllowedOrigins::parse(allowed).unwrap();
    let runtime = Runtime::new().unwrap();
    let context = Context::full(&runtime).unwrap();

    context.with(|ctx| {
        run::<Value>(&ctx, PAGE);
        run::<Value>(&ctx, frame);
        run::<Value>(&ctx, r#"__addReport("report", ""); __addReport("chart", "flex");"#);
        run::<Value>(&ctx, &render_script(&allowed));
        test(&ctx);
    });
}

fn cross_origin(referrer: &str) -> String {
    format!(r#"__frame({{ parentHref: null, referrer: "{referrer}" }})"#)
}

#[test]
fn allowed_embedder_keeps_report_visible() {
    with_page(&["https://a.example"], &cross_origin("https://a.example/dashboard"), |ctx| {
        run::<Value>(ctx, "__ready()");

        assert_eq!(text(ctx, "__state()"), "allowed");
        assert!(!flag(ctx, "__viewCount() > 0"));
        assert_eq!(text(ctx, r#"__display("report")"#), "");
        assert_eq!(text(ctx, r#"__display("chart")"#), "flex");
        assert!(!flag(ctx, "__observing()"));
    });
}

#[test]
fn other_embedder_sees_denial_view() {
    with_page(&["https://a.example"], &cross_origin("https://evil.example/"), |ctx| {
        run::<Value>(ctx, "__ready()");

        assert_eq!(text(ctx, "__state()"), "denied");
        assert_eq!(run::<i32>(ctx, "__viewCount()"), 1);
        assert_eq!(text(ctx, r#"__display("report")"#), "none");
        assert_eq!(text(ctx, r#"__display("chart")"#), "none");

        let view = text(ctx, "__viewText()");
        assert!(view.contains("origin not in allow-list"));
        assert!(view.contains("https://a.example"));
        assert!(flag(ctx, "__observing()"));
    });
}

#[test]
fn denial_recovers_and_restores_inline_display() {
    with_page(&["https://a.example"], &cross_origin(""), |ctx| {
        run::<Value>(ctx, "__ready()");
        assert_eq!(text(ctx, "__state()"), "denied");
        assert!(text(ctx, "__viewText()").contains("embedding origin could not be verified"));

        run::<Value>(ctx, r#"__setReferrer("https://a.example/embed"); __mutate()"#);

        assert_eq!(text(ctx, "__state()"), "allowed");
        assert_eq!(run::<i32>(ctx, "__viewCount()"), 0);
        assert_eq!(text(ctx, r#"__display("report")"#), "");
        assert_eq!(text(ctx, r#"__display("chart")"#), "flex");
        assert!(!flag(ctx, r#"__isMarkedHidden("chart")"#));
        assert!(!flag(ctx, "__observing()"));
    });
}

#[test]
fn repeated_denial_keeps_view_and_hides_new_content() {
    with_page(&["https://a.example"], &cross_origin("https://evil.example/"), |ctx| {
        run::<Value>(ctx, "__ready()");
        run::<Value>(ctx, r#"__setReasonText("marker")"#);

        run::<Value>(ctx, r#"__addReport("late", "block"); __mutate(); __load()"#);

        assert_eq!(text(ctx, "__state()"), "denied");
        assert_eq!(run::<i32>(ctx, "__viewCount()"), 1);
        assert_eq!(text(ctx, "__viewText()").matches("marker").count(), 1);
        assert_eq!(text(ctx, r#"__display("late")"#), "none");
    });
}

#[test]
fn changed_reason_updates_view() {
    with_page(&["https://a.example"], &cross_origin(""), |ctx| {
        run::<Value>(ctx, "__ready()");
        run::<Value>(ctx, r#"__setReferrer("https://evil.example/"); __mutate()"#);

        let view = text(ctx, "__viewText()");
        assert!(view.contains("origin not in allow-list"));
        assert!(!view.contains("could not be verified"));
        assert_eq!(run::<i32>(ctx, "__viewCount()"), 1);
    });
}

#[test]
fn observer_stops_after_last_recheck() {
    with_page(&["https://a.example"], &cross_origin(""), |ctx| {
        run::<Value>(ctx, "__ready(); __runTimers()");
        assert!(!flag(ctx, "__observing()"));

        run::<Value>(ctx, r#"__setReferrer("https://a.example/"); __mutate()"#);
        assert_eq!(text(ctx, "__state()"), "denied");
    });
}

#[test]
fn load_event_rechecks() {
    with_page(&["https://a.example"], &cross_origin(""), |ctx| {
        run::<Value>(ctx, "__ready()");
        run::<Value>(ctx, r#"__setReferrer("https://a.example/"); __load()"#);
        assert_eq!(text(ctx, "__state()"), "allowed");
    });
}

#[test]
fn readable_parent_location_wins_over_referrer() {
    let frame = r#"__frame({ parentHref: "http://127.0.0.1:8000/app", referrer: "https://evil.example/" })"#;
    with_page(&["http://localhost:8000"], frame, |ctx| {
        run::<Value>(ctx, "__ready()");
        assert_eq!(text(ctx, "__state()"), "allowed");
    });
}

#[test]
fn top_level_and_unrestricted_are_allowed() {
    with_page(&["https://a.example"], "__frame({ top: true })", |ctx| {
        run::<Value>(ctx, "__ready()");
        assert_eq!(text(ctx, "__state()"), "allowed");
    });

    with_page(&[], &cross_origin(""), |ctx| {
        run::<Value>(ctx, "__ready()");
        assert_eq!(text(ctx, "__state()"), "allowed");
    });
}

#[test]
fn script_agrees_with_evaluate() {
    let cases: [(&[&str], &str); 8] = [
        (&["https://a.example"], "https://a.example:443/x"),
        (&["https://a.example"], "https://b.example/"),
        (&["https://a.example"], "http://a.example/"),
        (&["https://a.example"], ""),
        (&[], "https://b.example/"),
        (&[], ""),
        (&["http://localhost:8000"], "http://127.0.0.1:8000/"),
        (&["http://localhost:8000"], "http://127.0.0.1:8001/"),
    ];

    for (entries, referrer) in cases {
        let context = if referrer.is_empty() {
            EmbeddingContext::embedded_unknown()
        } else {
            EmbeddingContext::embedded_by(Origin::parse(referrer).unwrap())
        };
        let expected = evaluate(&AllowedOrigins::parse(entries).unwrap(), &context);

        with_page(entries, &cross_origin(referrer), |ctx| {
            run::<Value>(ctx, "__ready()");
            let state = text(ctx, "__state()");
            assert_eq!(
                state == "allowed",
                expected.is_allowed(),
                "allow-list {entries:?}, referrer {referrer:?}: script said {state}, evaluate said {expected}"
            );
        });
    }
}
