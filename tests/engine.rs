use std::{fs, sync::Arc, thread};

use docs_finder::{
    engine::store::{self, ModelFile},
    EngineConfig, Error, RetrievalEngine, ScoredDocument, TFIDFData, Vocabulary,
};
use serde_json::{json, Value};

fn pets() -> Vec<Value> {
    vec![
        json!({"id": "1", "title": "", "content": "cat dog"}),
        json!({"id": "2", "title": "", "content": "dog bird"}),
        json!({"id": "3", "title": "", "content": "cat cat bird bird bird"}),
    ]
}

fn library() -> Vec<Value> {
    vec![
        json!({"id": "a", "title": "Library catalogues", "author": "Smith",
               "content": "Indexing of library catalogues and the retrieval of books."}),
        json!({"id": "b", "title": "Aerodynamics", "source": "cran",
               "content": "Boundary layer flow over a wing at supersonic speeds."}),
        json!({"id": "c", "title": "Information retrieval",
               "content": "Ranking documents by relevance with term weights and feedback."}),
        json!({"id": "d", "title": "Wing design",
               "content": "Supersonic wing design and the boundary layer."}),
        json!({"id": "e", "title": "Automatic indexing",
               "content": "Automatic indexing assigns index terms to documents in a library."}),
    ]
}

fn trained(records: &[Value]) -> RetrievalEngine {
    let engine = RetrievalEngine::new(EngineConfig::default());
    engine.train(records).unwrap();
    engine
}

fn summary(hits: &[ScoredDocument]) -> Vec<(String, f64)> {
    hits.iter().map(|h| (h.document.id.clone(), h.relevancy)).collect()
}

#[test]
fn cat_query_matches_hand_computed_scores() {
    let engine = trained(&pets());
    let snapshot = engine.snapshot().unwrap();
    let vocabulary: Vec<&str> = snapshot.vectorizer().model().vocabulary().iter().collect();
    assert_eq!(vocabulary, vec!["cat", "dog", "bird"]);

    let hits = engine.find("cat", 10).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3", "2"]);
    assert!((hits[0].relevancy - 1.0 / 2.0_f64.sqrt()).abs() < 1e-6);
    assert!((hits[1].relevancy - 2.0 / 13.0_f64.sqrt()).abs() < 1e-6);
    assert_eq!(hits[2].relevancy, 0.0);
}

#[test]
fn unknown_terms_score_zero_in_collection_order() {
    let engine = trained(&library());
    let hits = engine.find("xylophone quasar", 10).unwrap();
    assert_eq!(hits.len(), 5);
    for (pos, hit) in hits.iter().enumerate() {
        assert_eq!(hit.index, pos);
        assert_eq!(hit.relevancy, 0.0);
    }
}

#[test]
fn find_is_deterministic_and_respects_top() {
    let engine = trained(&library());
    let first = summary(&engine.find("library indexing", 3).unwrap());
    let second = summary(&engine.find("library indexing", 3).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(first[0].0, "e");
}

#[test]
fn query_stopwords_do_not_break_ranking() {
    let engine = trained(&library());
    let hits = engine.find("what about the supersonic wing?", 2).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["d", "b"]);
}

#[test]
fn save_then_load_reproduces_rankings() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::default().with_model_path(dir.path().join("model.cbor"));
    let engine = RetrievalEngine::new(config.clone());
    engine.train(&library()).unwrap();
    let before = summary(&engine.find("automatic library retrieval", 5).unwrap());
    let fed_before = summary(&engine.find_with_feedback("wing", &[1], &[3], 5).unwrap());
    engine.save().unwrap();

    let restored = RetrievalEngine::new(config);
    assert!(!restored.is_trained());
    restored.load().unwrap();
    assert_eq!(restored.document_count(), 5);
    assert_eq!(summary(&restored.find("automatic library retrieval", 5).unwrap()), before);
    assert_eq!(summary(&restored.find_with_feedback("wing", &[1], &[3], 5).unwrap()), fed_before);

    let a = engine.snapshot().unwrap();
    let b = restored.snapshot().unwrap();
    assert_eq!(a.vectorizer().model(), b.vectorizer().model());
    assert_eq!(a.documents(), b.documents());
}

#[test]
fn failed_load_keeps_current_model() {
    let dir = tempfile::tempdir().unwrap();
    let engine = trained(&pets());
    let before = summary(&engine.find("cat", 3).unwrap());

    assert!(matches!(engine.load_from(dir.path().join("missing.cbor")), Err(Error::Io { .. })));
    let corrupt = dir.path().join("corrupt.cbor");
    fs::write(&corrupt, [0xff_u8, 0x00, 0x13]).unwrap();
    assert!(engine.load_from(&corrupt).is_err());

    assert_eq!(summary(&engine.find("cat", 3).unwrap()), before);
}

#[test]
fn model_file_without_documents_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.cbor");
    let model = TFIDFData { vocabulary: Vocabulary::from_terms(["cat"]), idf: vec![0.5], weights: vec![] };
    store::write(&path, &ModelFile::new(vec![], model)).unwrap();

    let engine = trained(&pets());
    let before = engine.snapshot().unwrap();
    assert!(matches!(engine.load_from(&path), Err(Error::EmptyCorpus)));
    assert!(Arc::ptr_eq(&before, &engine.snapshot().unwrap()));
    assert_eq!(engine.find("cat", 10).unwrap().len(), 3);

    let fresh = RetrievalEngine::new(EngineConfig::default());
    assert!(fresh.load_from(&path).is_err());
    assert!(matches!(fresh.find("cat", 10), Err(Error::EmptyCorpus)));
}

#[test]
fn save_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.cbor");
    let engine = trained(&pets());
    engine.save_to(&path).unwrap();
    engine.train(&library()).unwrap();
    engine.save_to(&path).unwrap();

    let restored = RetrievalEngine::new(EngineConfig::default());
    restored.load_from(&path).unwrap();
    assert_eq!(restored.document_count(), 5);
    assert!(!dir.path().join("model.cbor.tmp").exists());
}

#[test]
fn feedback_out_of_range_leaves_model_unchanged() {
    let engine = trained(&pets());
    let before = engine.snapshot().unwrap();
    let err = engine.find_with_feedback("cat", &[0], &[7], 3).unwrap_err();
    assert!(matches!(err, Error::InvalidFeedbackIndex { index: 7, document_count: 3 }));
    let after = engine.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(engine.find("cat", 3).unwrap().len(), 3);
}

#[test]
fn feedback_with_empty_groups_matches_plain_find() {
    let engine = trained(&library());
    let plain = summary(&engine.find("boundary layer", 5).unwrap());
    let fed = summary(&engine.find_with_feedback("boundary layer", &[], &[], 5).unwrap());
    assert_eq!(plain, fed);
}

#[test]
fn train_from_path_skips_invalid_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corpus.json");
    let mut records = pets();
    records.push(json!({"title": "no id", "content": "cat"}));
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

    let engine = RetrievalEngine::new(EngineConfig::default());
    let report = engine.train_from_path(&path).unwrap();
    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, 3);
}

#[test]
fn concurrent_queries_see_complete_models() {
    let engine = Arc::new(trained(&pets()));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    let hits = engine.find("cat bird", 10).unwrap();
                    // either the pets model (3 docs) or the library model (5 docs), never a mix
                    assert!(hits.len() == 3 || hits.len() == 5);
                    assert!(hits.iter().all(|h| h.relevancy.is_finite()));
                }
            })
        })
        .collect();
    for _ in 0..5 {
        engine.train(&library()).unwrap();
        engine.train(&pets()).unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }
}
