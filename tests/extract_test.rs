use socialgraph::extract::{
    extract_entities, extract_features, extract_query_terms, extract_topics, Entity, EntityKind,
    MIN_TEXT_CHARS,
};

#[test]
fn test_entity_example() {
    let entities = extract_entities("check https://example.com #finance cc @alice");
    assert_eq!(
        entities,
        vec![
            Entity::new(EntityKind::Url, "https://example.com"),
            Entity::new(EntityKind::Hashtag, "#finance"),
            Entity::new(EntityKind::Mention, "@alice"),
        ]
    );
}

#[test]
fn test_entities_keep_duplicates_and_group_by_kind() {
    let entities = extract_entities("@bob said #rust then @bob again, see http://a.io and #rust");
    let kinds: Vec<_> = entities.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::Url,
            EntityKind::Hashtag,
            EntityKind::Hashtag,
            EntityKind::Mention,
            EntityKind::Mention,
        ]
    );
    assert_eq!(entities[0].value, "http://a.io");
}

#[test]
fn test_noisy_tokens_never_become_topics() {
    let text = "ssssssssswswwwwwsswws cryptocurrency ssssssssswswwwwwsswws cryptocurrency exchanges";
    let topics = extract_topics(text, 5);
    assert!(topics.contains(&"cryptocurrency".to_string()));
    assert!(!topics.contains(&"ssssssssswswwwwwsswws".to_string()));
}

#[test]
fn test_topics_are_deterministic_and_bounded() {
    let text = "Federated learning trains models across devices; federated averaging merges \
                model updates while devices keep training data local.";
    let first = extract_topics(text, 3);
    assert_eq!(first.len(), 3);
    for _ in 0..10 {
        assert_eq!(extract_topics(text, 3), first);
    }
    assert_eq!(first[0], "federated");
}

#[test]
fn test_minimum_length_boundary() {
    let short = "a".repeat(MIN_TEXT_CHARS - 1);
    assert!(extract_topics(&short, 5).is_empty());

    let text = "kubernetes kubernetes operators reconcile clusters nightly";
    assert!(text.chars().count() >= MIN_TEXT_CHARS);
    assert_eq!(extract_topics(text, 1), vec!["kubernetes"]);
}

#[test]
fn test_features_combine_both_extractors() {
    let features = extract_features(
        "Benchmarks of tokio runtimes: tokio scheduling beats threads, details at https://tokio.rs #async",
        2,
    );
    assert_eq!(features.topics[0], "tokio");
    assert_eq!(features.topics.len(), 2);
    assert_eq!(features.entities.len(), 2);
}

#[test]
fn test_query_terms() {
    let terms = extract_query_terms("How is the Ethereum merge affecting validators?");
    assert_eq!(terms, vec!["ethereum", "merge", "affecting", "validators"]);
}
