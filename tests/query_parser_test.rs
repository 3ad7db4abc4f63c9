use proxima::query::{NodeKind, parse};
use proxima::{ProximaError, QueryParser};

#[test]
fn test_redundant_parens_are_dropped() -> proxima::Result<()> {
    let tree = parse("((FOO == 'bar'))")?;
    assert_eq!(tree.to_string(), "FOO == 'bar'");
    Ok(())
}

#[test]
fn test_deeply_nested_parens() -> proxima::Result<()> {
    let query = format!("{}FOO == 'bar'{}", "(".repeat(18), ")".repeat(18));
    let tree = parse(&query)?;
    assert_eq!(tree.to_string(), "FOO == 'bar'");
    assert_eq!(tree.len(), 4);
    Ok(())
}

#[test]
fn test_nested_parens_around_disjunction() -> proxima::Result<()> {
    let tree = parse("(((((FOO == 'bar')) || (FOO2 == 'bar2'))))")?;
    assert_eq!(tree.to_string(), "(FOO == 'bar') || (FOO2 == 'bar2')");
    let top = tree.children(tree.root())[0];
    assert_eq!(tree.kind(top), Some(&NodeKind::Or));
    assert_eq!(tree.children(top).len(), 2);
    Ok(())
}

#[test]
fn test_rendering_reparses_to_same_text() -> proxima::Result<()> {
    let parser = QueryParser::new();
    for query in [
        "content:phrase((TEXT_A || TEXT_B), termOffsetMap, 'quick', 'fox') && (TEXT_A == 'quick')",
        "!content:within(TEXT, 3, termOffsetMap, 'it\\'s', 'fox')",
        "((_Delayed_ = true) && (content:adjacent(TEXT, termOffsetMap, 'a', 'b') && (TEXT == 'a')))",
        "(A == 'x' || B != 'y') && C >= 3",
    ] {
        let rendered = parser.parse(query)?.to_string();
        assert_eq!(parser.parse(&rendered)?.to_string(), rendered, "{query}");
    }
    Ok(())
}

#[test]
fn test_invalid_query_reports_parse_error() {
    for query in ["TEXT == ", "content:phrase(TEXT, 'a'", "&& TEXT == 'a'", ""] {
        assert!(matches!(parse(query), Err(ProximaError::Parse(_))), "{query}");
    }
}
