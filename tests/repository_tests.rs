//! Asset repository integration tests

use std::path::PathBuf;

use maku::assets::{FileSystemListRepository, InMemoryListRepository, ListRepository};
use maku::{Action, ActionKind, ActionList, Arg, Directive, Engine};

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("maku_{name}_{}", std::process::id()))
}

#[tokio::test]
async fn filesystem_repository_loads_scripts() {
    let dir = scratch_dir("fs_repo");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(
        dir.join("intro.md"),
        "# Intro\n[SAY speaker=N]\nwelcome\n",
    )
    .await
    .unwrap();
    tokio::fs::write(
        dir.join("finale.md"),
        "# Finale\n[SAY speaker=N]\nfarewell\n",
    )
    .await
    .unwrap();
    tokio::fs::write(dir.join("notes.txt"), "not a script").await.unwrap();

    let repo = FileSystemListRepository::new(&dir);

    let mut ids = repo.list_ids().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec!["finale", "intro"]);

    assert!(repo.exists("intro").await.unwrap());
    assert!(!repo.exists("credits").await.unwrap());

    let intro = repo.load("intro").await.unwrap();
    assert_eq!(intro.id, "intro");
    assert_eq!(intro.name, "Intro");
    assert_eq!(intro.len(), 1);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn filesystem_repository_reports_parse_failures() {
    let dir = scratch_dir("fs_repo_bad");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("bad.md"), "[CHECK var=a cmp=eq value=1 then=nowhere]\n")
        .await
        .unwrap();

    let repo = FileSystemListRepository::new(&dir);
    let err = repo.load("bad").await.unwrap_err();
    assert!(err.to_string().contains("nowhere"));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn engine_fills_its_asset_table_from_a_repository() {
    let mut repo = InMemoryListRepository::new();
    repo.add(ActionList::new(
        "intro",
        vec![Action::new(ActionKind::Say {
            speaker: Arg::literal("N"),
            text: Arg::literal("loaded from the repository"),
            seconds: 0.0,
        })],
    ));

    let mut engine = Engine::new();
    let loaded = engine.load_assets(&repo).await.unwrap();
    assert_eq!(loaded, 1);

    engine.start_asset("intro").unwrap();
    let report = engine.tick(0.0);
    assert_eq!(
        report.directives,
        vec![Directive::Say {
            speaker: "N".to_string(),
            text: "loaded from the repository".to_string(),
        }]
    );
}
