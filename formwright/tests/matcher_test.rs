use formwright::{escape, exact_pattern, label_pattern, prefix_pattern, MatchMode, MatchPattern};

#[test]
fn exact_pattern_is_anchored_and_case_insensitive() -> anyhow::Result<()> {
    let pattern = exact_pattern("Contoso Ltd")?;
    assert!(pattern.is_match("Contoso Ltd"));
    assert!(pattern.is_match("contoso ltd"));
    assert!(pattern.is_match("  CONTOSO LTD "));
    assert!(!pattern.is_match("Contoso Ltd (sample)"));
    assert!(!pattern.is_match("The Contoso Ltd"));
    Ok(())
}

#[test]
fn prefix_pattern_only_anchors_the_start() -> anyhow::Result<()> {
    let pattern = prefix_pattern("Contoso")?;
    assert!(pattern.is_match("Contoso Pharmaceuticals (sample)"));
    assert!(pattern.is_match("contoso"));
    assert!(!pattern.is_match("Big Contoso"));
    Ok(())
}

#[test]
fn metacharacters_match_only_themselves() -> anyhow::Result<()> {
    let exact = exact_pattern("A.B (C)")?;
    assert!(exact.is_match("A.B (C)"));
    assert!(!exact.is_match("AxB (C)"));
    assert!(!exact.is_match("A.B C"));

    let prefix = prefix_pattern("$100+ [net]")?;
    assert!(prefix.is_match("$100+ [net] per seat"));
    assert!(!prefix.is_match("$1000 [net]"));

    assert_eq!(escape("a.b*c"), r"a\.b\*c");
    Ok(())
}

#[test]
fn label_pattern_tolerates_markers_and_suffixes() -> anyhow::Result<()> {
    let pattern = label_pattern("Account")?;
    assert!(pattern.is_match("Account"));
    assert!(pattern.is_match("Account*"));
    assert!(pattern.is_match("Account, Lookup"));
    assert!(pattern.is_match("account , required"));
    assert!(!pattern.is_match("Account Name"));
    assert!(!pattern.is_match("Account, Contact"));
    Ok(())
}

#[test]
fn patterns_are_pure_and_repeatable() -> anyhow::Result<()> {
    let first = MatchPattern::new("Jane", MatchMode::Prefix)?;
    let second = prefix_pattern("Jane")?;
    assert_eq!(first, second);
    assert_eq!(first.literal(), "Jane");
    assert_eq!(first.to_string(), "Jane*");
    for _ in 0..3 {
        assert!(first.is_match("Jane Doe"));
    }
    assert_ne!(first, exact_pattern("Jane")?);
    Ok(())
}
