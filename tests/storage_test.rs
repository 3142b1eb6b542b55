use tandem_rs::error::Error;
use tandem_rs::model::CoupleId;
use tandem_rs::storage::ImageStore;

#[tokio::test]
async fn upload_copies_into_couple_directory() {
    let root = tempfile::tempdir().unwrap();
    let source = tempfile::tempdir().unwrap();
    let photo = source.path().join("Beach.PNG");
    std::fs::write(&photo, b"fake png bytes").unwrap();

    let store = ImageStore::new(root.path(), "https://img.example.com/memories");
    let couple = CoupleId::new();
    let path = store.upload(couple, &photo).await.unwrap();

    assert!(path.starts_with(&format!("{couple}/")));
    assert!(path.ends_with(".png"));
    assert!(store.exists(&path).await.unwrap());
    assert_eq!(
        std::fs::read(root.path().join(&path)).unwrap(),
        b"fake png bytes"
    );
    assert_eq!(
        store.public_url(&path),
        format!("https://img.example.com/memories/{path}")
    );
}

#[tokio::test]
async fn uploading_a_missing_file_is_a_validation_error() {
    let root = tempfile::tempdir().unwrap();
    let store = ImageStore::new(root.path(), "file:///tmp");

    let err = store
        .upload(CoupleId::new(), &root.path().join("nope.jpg"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn remove_deletes_once() {
    let root = tempfile::tempdir().unwrap();
    let photo = root.path().join("in.jpg");
    std::fs::write(&photo, b"jpg").unwrap();
    let store = ImageStore::new(root.path().join("store"), "file:///store");

    let path = store.upload(CoupleId::new(), &photo).await.unwrap();
    store.remove(&path).await.unwrap();

    assert!(!store.exists(&path).await.unwrap());
    assert!(matches!(
        store.remove(&path).await.unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn escaping_paths_are_refused() {
    let root = tempfile::tempdir().unwrap();
    let store = ImageStore::new(root.path(), "file:///store");
    assert!(matches!(
        store.remove("../outside.jpg").await.unwrap_err(),
        Error::Validation(_)
    ));
}
