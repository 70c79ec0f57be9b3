use shopview_core::PageLink;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shopview"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn browse_defaults_to_category_view() {
    let cli = Cli::try_parse_from(["shopview", "browse"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Browse {
            ref view,
            address: None,
            category: None,
            page: None,
        }) if view == "category"
    ));
}

#[test]
fn browse_accepts_address_category_and_page() {
    let cli = Cli::try_parse_from([
        "shopview",
        "browse",
        "--view",
        "search",
        "--address",
        "?query=serum&rating=4",
        "--category",
        "12",
        "--page",
        "3",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Browse {
            ref view,
            address: Some(ref a),
            category: Some(12),
            page: Some(3),
        }) if view == "search" && a == "?query=serum&rating=4"
    ));
}

#[test]
fn browse_rejects_non_numeric_category() {
    let result = Cli::try_parse_from(["shopview", "browse", "--category", "lips"]);
    assert!(result.is_err());
}

#[test]
fn parses_tree_and_views_commands() {
    let tree = Cli::try_parse_from(["shopview", "tree"]).expect("expected valid cli args");
    assert!(matches!(tree.command, Some(Commands::Tree)));

    let views = Cli::try_parse_from(["shopview", "views"]).expect("expected valid cli args");
    assert!(matches!(views.command, Some(Commands::Views)));
}

#[test]
fn canonicalize_requires_a_query() {
    assert!(Cli::try_parse_from(["shopview", "canonicalize"]).is_err());
    let cli = Cli::try_parse_from(["shopview", "canonicalize", "rating=4"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Canonicalize { ref query }) if query == "rating=4"
    ));
}

#[test]
fn canonicalize_orders_keys_and_drops_page_one() {
    assert_eq!(
        browse::canonicalize("?rating=4&brand=9&brand=2&category=3&page=1"),
        "?category=3&brand=2&brand=9&rating=4"
    );
}

#[test]
fn canonicalize_of_nothing_is_empty() {
    assert_eq!(browse::canonicalize("?"), "");
    assert_eq!(browse::canonicalize("page=abc"), "");
}

#[test]
fn page_strip_brackets_current_page() {
    let links = [
        PageLink::Page {
            number: 1,
            current: false,
        },
        PageLink::Ellipsis,
        PageLink::Page {
            number: 4,
            current: true,
        },
        PageLink::Page {
            number: 5,
            current: false,
        },
    ];
    assert_eq!(browse::format_page_links(&links), "1 ... [4] 5");
    assert_eq!(browse::format_page_links(&[]), "");
}
