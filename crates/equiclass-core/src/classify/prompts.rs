//! Prompt text for extraction, consolidation and query building

const SYMBOL_RULES: &str = "\
Reproduce every piece of text and every symbol (arrows, angle brackets, pipes, carets, \
percent signs, ampersands, lines) exactly as it appears whenever it can be written as a \
character. Never describe a symbol in words: '< word >' is returned as '< word >', not as \
'the word surrounded by angle brackets'. Never add characters that are not on the ball. \
Record the colour of a symbol when it has one, for example 'Titleist Pro V1 with a red arrow \
underneath'. Keep the original order of the markings and keep their spacing.";

const MANUFACTURER_RULE: &str = "\
The manufacturer must be copied exactly from this list: {manufacturers}. If nothing on the \
ball matches an entry, or you are not certain, set the manufacturer to 'unknown'. Never \
guess a manufacturer from the style of the ball.";

const OUTPUT_SHAPE: &str = r#"{
    "manufacturer": "some manufacturer",
    "colour": "some colour",
    "markings": "some markings",
    "rationale": "how the fields were decided"
}"#;

fn manufacturer_rule(manufacturers: &[String]) -> String {
    MANUFACTURER_RULE.replace("{manufacturers}", &manufacturers.join(", "))
}

/// System prompt for an independent extraction pass
pub fn extraction_prompt(manufacturers: &[String]) -> String {
    format!(
        "You are reading one or more photographs of a single golf ball and extracting its \
details.\n\n{symbols}\n\nIf a marking is partly hidden or runs off the edge of the ball, \
leave it out. Only report markings you can identify with complete certainty.\n\n\
Instructions:\n\
1. manufacturer: {manufacturer}\n\
2. colour: the colour of the ball itself.\n\
3. markings: all text, and text combined with symbols, printed on the ball. Pay particular \
attention to the edges of the ball.\n\n\
Respond with JSON only, shaped like this:\n{shape}",
        symbols = SYMBOL_RULES,
        manufacturer = manufacturer_rule(manufacturers),
        shape = OUTPUT_SHAPE,
    )
}

/// System prompt for reconciling earlier passes into one record
pub fn consolidation_prompt(manufacturers: &[String], json_list: &str) -> String {
    format!(
        "Several independent readings of the same golf ball are listed below as JSON objects. \
Combine them, together with what you can see in the photographs, into the single JSON \
object that describes the ball most accurately.\n\n{symbols}\n\n\
Readings:\n{json_list}\n\n\
Instructions:\n\
- manufacturer: {manufacturer}\n\
- colour: the most representative colour across the readings and the photographs.\n\
- markings: remove duplicates. Where readings disagree, keep the version that best matches \
the photographs. Report only what is printed on the ball, without rewording or inferred \
detail, written as natural language rather than fragments.\n\n\
Respond with JSON only, shaped like this:\n{shape}",
        symbols = SYMBOL_RULES,
        json_list = json_list,
        manufacturer = manufacturer_rule(manufacturers),
        shape = OUTPUT_SHAPE,
    )
}

/// Prompt turning markings into a full-text search query. Only the markings
/// are included; manufacturer and colour are handled by the filter.
pub fn nlp_prompt(markings: &str) -> String {
    format!(
        "Turn the golf ball markings at the bottom into a single concise sentence to be used \
as a full-text search query.\n\n\
Instructions:\n\
- Keep every special character, including '%', '&', '<< >>' and '< >'. They are essential \
to the search.\n\
- Put quotes around phrases that must be matched as one unit and prefix each with '+' to \
make it required. For example 'best restaurants in New York' becomes \
+\"best\" +\"restaurants\" in +\"New York\".\n\
- Do not quote a phrase that is already quoted.\n\
- Do not add words, slashes, brackets or other punctuation that are not in the markings.\n\
- Respond with the query only.\n\n\
Markings:\n{}",
        markings
    )
}

/// User text accompanying the images
pub const IMAGE_INSTRUCTION: &str = "Extract the manufacturer, colour and markings of the golf ball in these images.";
