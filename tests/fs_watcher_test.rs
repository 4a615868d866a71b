use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use catalogd::catalog::CatalogOrchestrator;
use catalogd::resource::{CallOp, MemoryBackend, ResourceKind};
use catalogd::watcher::FsWatcher;
use tempfile::TempDir;
use tokio::sync::oneshot;

async fn wait_for(condition: impl FnMut() -> bool) -> bool {
    wait_for_attempts(100, condition).await
}

async fn wait_for_attempts(attempts: usize, mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..attempts {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

fn make_catalog(path: &Path) {
    fs::create_dir_all(path.join("data")).unwrap();
    fs::create_dir_all(path.join("mapping")).unwrap();
    fs::write(path.join("mapping/catalog.xmi"), "<xmi:XMI/>").unwrap();
}

#[tokio::test]
async fn test_catalog_follows_directory_lifecycle() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("catalogs");
    let staging = temp.path().join("staging");
    fs::create_dir_all(&root).unwrap();
    make_catalog(&staging.join("sales"));

    let fs_watcher = FsWatcher::builder()
        .debounce_ms(50)
        .tick_ms(10)
        .build()
        .unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = CatalogOrchestrator::builder()
        .base_dir(&root)
        .backend(backend.clone())
        .hub(fs_watcher.hub())
        .build()
        .unwrap();

    orchestrator.start();
    assert!(orchestrator.registry().is_empty());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(fs_watcher.run(async {
        let _ = stop_rx.await;
    }));

    // Move a complete catalog in so it appears in one step.
    let sales = root.join("sales");
    fs::rename(staging.join("sales"), &sales).unwrap();
    assert!(wait_for(|| orchestrator.registry().contains(&sales)).await);
    assert!(wait_for(|| backend.live_count() == 4).await);

    fs::remove_dir_all(&sales).unwrap();
    assert!(wait_for(|| !orchestrator.registry().contains(&sales)).await);
    assert!(wait_for(|| backend.live_count() == 0).await);

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();
    orchestrator.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_of_catalogs_does_not_stall_delivery() {
    const CATALOGS: usize = 300;

    let temp = TempDir::new().unwrap();
    let root = temp.path().join("catalogs");
    let staging = temp.path().join("staging");
    fs::create_dir_all(&root).unwrap();
    for i in 0..CATALOGS {
        make_catalog(&staging.join(format!("catalog-{i:03}")));
    }

    let fs_watcher = FsWatcher::builder()
        .debounce_ms(50)
        .tick_ms(10)
        .backlog_warning(8)
        .build()
        .unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = CatalogOrchestrator::builder()
        .base_dir(&root)
        .backend(backend.clone())
        .hub(fs_watcher.hub())
        .build()
        .unwrap();
    orchestrator.start();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(fs_watcher.run(async {
        let _ = stop_rx.await;
    }));

    // Every catalog adds an OS watch while notify keeps queueing events.
    for i in 0..CATALOGS {
        let name = format!("catalog-{i:03}");
        fs::rename(staging.join(&name), root.join(&name)).unwrap();
    }

    assert!(wait_for_attempts(1200, || orchestrator.registry().len() == CATALOGS).await);
    assert!(wait_for_attempts(1200, || backend.live_count() == CATALOGS * 4).await);

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();
    orchestrator.stop();
    assert_eq!(backend.live_count(), 0);
}

#[tokio::test]
async fn test_mapping_created_after_catalog_is_watched() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("catalogs");
    fs::create_dir_all(&root).unwrap();

    let fs_watcher = FsWatcher::builder()
        .debounce_ms(50)
        .tick_ms(10)
        .build()
        .unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let orchestrator = CatalogOrchestrator::builder()
        .base_dir(&root)
        .backend(backend.clone())
        .hub(fs_watcher.hub())
        .build()
        .unwrap();
    orchestrator.start();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(fs_watcher.run(async {
        let _ = stop_rx.await;
    }));

    // An empty catalog directory, filled in afterwards.
    let sales = root.join("sales");
    fs::create_dir(&sales).unwrap();
    assert!(wait_for(|| orchestrator.registry().contains(&sales)).await);
    let mapping_creates = || backend.count(CallOp::Create, ResourceKind::MappingResource);
    let registered = mapping_creates();
    assert!(registered >= 1);

    fs::create_dir(sales.join("mapping")).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let xmi = sales.join("mapping/catalog.xmi");
    fs::write(&xmi, "<xmi:XMI/>").unwrap();
    assert!(wait_for(|| mapping_creates() > registered).await);

    // Let the write settle, then edit.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let written = mapping_creates();
    fs::write(&xmi, "<xmi:XMI version=\"2\"/>").unwrap();
    assert!(wait_for(|| mapping_creates() > written).await);

    assert_eq!(backend.live(ResourceKind::MappingResource).len(), 1);
    assert_eq!(orchestrator.registry().len(), 1);

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();
    orchestrator.stop();
}
