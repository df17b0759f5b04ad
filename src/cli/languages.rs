use reviewgraph::indexer::engine::ParserEngine;
use reviewgraph::language::Language;

pub fn list_languages() {
    let engine = ParserEngine::initialize(&Language::ALL).ok();

    println!("Supported languages:");
    for language in Language::ALL {
        let tier = match &engine {
            Some(engine) if engine.supports(language) => "structural",
            _ => "regex",
        };
        println!(
            "  {:<12} {:<10} .{}",
            language.as_str(),
            tier,
            language.extensions().join(" .")
        );
    }
    println!("\nOther extensions are extracted with generic C-family patterns.");
}
