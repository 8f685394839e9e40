use karaoke_search::catalog::{Catalog, CatalogCache, DEFAULT_HEADER_LABEL};
use karaoke_search::interactive::{InteractiveSession, Prompter, SessionCommand};
use karaoke_search::{AccessMode, AccessPolicy, QuotaSettings, SearchService, StaticCredentials};
use std::io::Cursor;

/// Answers prompts from a fixed script instead of the terminal.
struct ScriptedPrompter {
    secrets: Vec<String>,
    watches_ad: bool,
    reward_prompts: usize,
}

impl ScriptedPrompter {
    fn new(watches_ad: bool) -> Self {
        Self {
            secrets: Vec::new(),
            watches_ad,
            reward_prompts: 0,
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn secret(&mut self, _identity: &str) -> karaoke_search::Result<String> {
        Ok(self.secrets.pop().unwrap_or_default())
    }

    fn confirm_reward(&mut self, _reward: u32) -> karaoke_search::Result<bool> {
        self.reward_prompts += 1;
        Ok(self.watches_ad)
    }
}

fn service() -> SearchService {
    let catalog = Catalog::from_rows(
        vec![
            vec!["EXILE", "Choo Choo TRAIN"],
            vec!["あいみょん", "マリーゴールド"],
            vec!["YOASOBI", "夜に駆ける"],
        ],
        DEFAULT_HEADER_LABEL,
    );
    let policy = AccessPolicy::new(AccessMode::Quota)
        .with_quota(QuotaSettings {
            initial_limit: 1,
            reward_limit: 2,
        })
        .with_credentials([("alice", "pw1")].into_iter().collect::<StaticCredentials>());
    SearchService::new(policy, CatalogCache::preloaded(catalog))
}

fn run_script(service: &SearchService, prompter: ScriptedPrompter, script: &str) -> (String, karaoke_search::SessionState) {
    let mut repl = InteractiveSession::new(service, prompter);
    let mut out = Vec::new();
    repl.run(Cursor::new(script.to_string()), &mut out).unwrap();
    (String::from_utf8(out).unwrap(), repl.session().clone())
}

#[test]
fn test_quota_denial_then_unlock() {
    let svc = service();
    let (out, session) = run_script(
        &svc,
        ScriptedPrompter::new(true),
        "exile\nマリー\n:unlock\nマリー\n:quit\n",
    );

    assert!(out.contains("Choo Choo TRAIN"));
    assert!(out.contains("free search limit of 1 reached"));
    assert!(out.contains(":unlock"));
    assert!(out.contains("マリーゴールド"));
    assert_eq!(session.search_count(), 2);
    assert_eq!(session.search_limit(), 3);
    assert_eq!(session.last_query(), "マリー");
}

#[test]
fn test_declined_ad_keeps_limit() {
    let svc = service();
    let (out, session) = run_script(&svc, ScriptedPrompter::new(false), "exile\n:unlock\nyoasobi\n");

    assert!(out.contains("Unlock cancelled"));
    assert_eq!(session.search_limit(), 1);
    assert_eq!(session.last_query(), "exile");
}

#[test]
fn test_login_lifts_quota_and_logout_restores_it() {
    let svc = service();
    let (out, session) = run_script(
        &svc,
        ScriptedPrompter::new(false),
        "exile\n:login alice pw1\nyoasobi\nマリー\n:logout\n夜\n",
    );

    assert!(out.contains("Logged in as"));
    assert!(out.contains("夜に駆ける"));
    assert!(out.contains("Logged out"));
    assert!(out.contains("free search limit of 1 reached"));
    assert!(!session.is_privileged());
    assert_eq!(session.search_count(), 1);
}

#[test]
fn test_login_prompts_for_missing_password() {
    let svc = service();
    let mut prompter = ScriptedPrompter::new(false);
    prompter.secrets.push("wrong".to_string());
    let (out, session) = run_script(&svc, prompter, ":login alice\n:login bob pw1\n");

    assert!(out.contains("wrong password"));
    assert!(out.contains("user id not found"));
    assert!(!session.is_privileged());
}

#[test]
fn test_handle_reports_unknown_command_and_continues() {
    let svc = service();
    let mut repl = InteractiveSession::new(&svc, ScriptedPrompter::new(false));
    let mut out = Vec::new();

    let keep_going = repl
        .handle(SessionCommand::Unknown(":dance".to_string()), &mut out)
        .unwrap();
    assert!(keep_going);
    assert!(!repl.handle(SessionCommand::Quit, &mut out).unwrap());
}

#[test]
fn test_list_shows_preview() {
    let svc = service();
    let (out, session) = run_script(&svc, ScriptedPrompter::new(false), ":list\n");

    assert!(out.contains("EXILE"));
    assert!(out.contains("YOASOBI"));
    assert_eq!(session.search_count(), 0);
}

#[test]
fn test_unlock_without_quota_is_a_no_op() {
    let svc = service();
    let (out, session) = run_script(
        &svc,
        ScriptedPrompter::new(true),
        ":login alice pw1\n:unlock\n",
    );

    assert!(out.contains("No search quota applies"));
    assert!(!out.contains("Unlocked"));
    assert_eq!(session.search_limit(), 1);

    let open = SearchService::new(
        AccessPolicy::new(AccessMode::Credentials),
        CatalogCache::preloaded(Catalog::default()),
    );
    let mut repl = InteractiveSession::new(&open, ScriptedPrompter::new(true));
    let mut out = Vec::new();
    repl.handle(SessionCommand::Unlock, &mut out).unwrap();

    assert!(String::from_utf8(out).unwrap().contains("No search quota applies"));
    assert_eq!(repl.session().search_limit(), 3);
}
