//! End-to-end visit tests
//!
//! One visitor, one cookie jar: the landing page redirects, the destination
//! shows the return banner, and following it back must not bounce the
//! visitor to the campaign again.

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use takeover::banner::ReturnBanner;
use takeover::config::{BannerSettings, DispatcherSettings};
use takeover::host::{ManualClock, SimulatedPage, Window};
use takeover::protocol::has_param;
use takeover::redirect::{DispatchDecision, Dispatcher};
use takeover::storage::{CookieStore, FileCookieJar, MemoryCookieStore};

fn dispatcher() -> Dispatcher {
    Dispatcher::from_settings(DispatcherSettings::with_rules([(
        "2024-12-03",
        "https://give.example.org/tuesday",
    )]))
    .unwrap()
}

fn banner() -> ReturnBanner {
    ReturnBanner::from_settings(BannerSettings::with_template("Continue to {domain}")).unwrap()
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 12, 3, 15, 0, 0).unwrap(),
    ))
}

#[test]
fn test_redirect_banner_and_return() {
    let clock = clock();
    let mut cookies = MemoryCookieStore::new(clock.clone());

    let mut landing = SimulatedPage::parse("https://www.example.org/?ref=mail").unwrap();
    let first = dispatcher().run(&mut landing, &mut cookies, &*clock);
    assert!(matches!(first.decision, DispatchDecision::Redirect { .. }));
    let destination = first.navigated_to.unwrap();

    let mut donate = SimulatedPage::parse(&destination).unwrap();
    let shown = banner().run(&mut donate, &mut cookies, &*clock);
    let link = shown.link.unwrap();
    assert_eq!(link.view.text, "Continue to www.example.org");
    assert_eq!(link.view.href, "https://www.example.org/?ref=mail");

    let back = link.click(&mut donate);
    let mut returned = SimulatedPage::parse(&back).unwrap();
    assert!(has_param(returned.location(), "no-redirect"));
    assert!(has_param(returned.location(), "ref"));

    let second = dispatcher().run(&mut returned, &mut cookies, &*clock);
    assert_eq!(second.decision, DispatchDecision::OptOut);
    assert!(returned.navigations().is_empty());
}

#[test]
fn test_plain_reload_after_redirect_is_suppressed() {
    let clock = clock();
    let mut cookies = MemoryCookieStore::new(clock.clone());

    let mut landing = SimulatedPage::parse("https://www.example.org/").unwrap();
    dispatcher().run(&mut landing, &mut cookies, &*clock);

    clock.advance(Duration::minutes(1));
    let mut reload = SimulatedPage::parse("https://www.example.org/").unwrap();
    let outcome = dispatcher().run(&mut reload, &mut cookies, &*clock);

    assert_eq!(outcome.decision, DispatchDecision::Suppressed);
    assert!(reload.navigations().is_empty());
}

#[test]
fn test_banner_rerun_is_idempotent() {
    let clock = clock();
    let mut cookies = MemoryCookieStore::new(clock.clone());
    let mut page = SimulatedPage::parse(
        "https://give.example.org/tuesday?was-redirected=&originating-url=https%3A%2F%2Fwww.example.org%2F",
    )
    .unwrap();

    let first = banner().run(&mut page, &mut cookies, &*clock);
    let cleaned = page.location().clone();
    let second = banner().run(&mut page, &mut cookies, &*clock);

    assert!(first.link.is_some());
    assert!(second.link.is_some());
    assert_eq!(second.rewritten_url, None);
    assert_eq!(page.location(), &cleaned);
    assert_eq!(page.history().len(), 1);
    assert_eq!(cookies.get("originatingUrl").as_deref(), Some("https://www.example.org/"));
}

#[test]
fn test_jar_carries_state_between_runs() {
    let clock = clock();
    let path = std::env::temp_dir().join(format!("takeover-session-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);

    {
        let mut jar = FileCookieJar::open(&path, clock.clone()).unwrap();
        let mut landing = SimulatedPage::parse("https://www.example.org/").unwrap();
        dispatcher().run(&mut landing, &mut jar, &*clock);
        jar.save().unwrap();
    }

    let mut jar = FileCookieJar::open(&path, clock.clone()).unwrap();
    assert!(jar.contains("redirectSuppressed"));
    let mut again = SimulatedPage::parse("https://www.example.org/").unwrap();
    let outcome = dispatcher().run(&mut again, &mut jar, &*clock);
    assert_eq!(outcome.decision, DispatchDecision::Suppressed);

    let _ = std::fs::remove_file(&path);
}
