use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Turns raw text into the normalized term sequence the index and the
/// statistics tables are built from. Queries must go through the same
/// analyzer that produced the corpus, or their terms will not line up
/// with the persisted term universe.
pub trait Analyzer {
    fn analyze(&self, text: &str) -> Vec<String>;
}

// nltk's Russian stopword list.
const STOPWORDS: &[&str] = &[
    "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то",
    "все", "она", "так", "его", "но", "да", "ты", "к", "у", "же", "вы", "за",
    "бы", "по", "только", "ее", "мне", "было", "вот", "от", "меня", "еще",
    "нет", "о", "из", "ему", "теперь", "когда", "даже", "ну", "вдруг", "ли",
    "если", "уже", "или", "ни", "быть", "был", "него", "до", "вас", "нибудь",
    "опять", "уж", "вам", "ведь", "там", "потом", "себя", "ничего", "ей",
    "может", "они", "тут", "где", "есть", "надо", "ней", "для", "мы", "тебя",
    "их", "чем", "была", "сам", "чтоб", "без", "будто", "чего", "раз", "тоже",
    "себе", "под", "будет", "ж", "тогда", "кто", "этот", "того", "потому",
    "этого", "какой", "совсем", "ним", "здесь", "этом", "один", "почти",
    "мой", "тем", "чтобы", "нее", "сейчас", "были", "куда", "зачем", "всех",
    "никогда", "можно", "при", "наконец", "два", "об", "другой", "хоть",
    "после", "над", "больше", "тот", "через", "эти", "нас", "про", "всего",
    "них", "какая", "много", "разве", "три", "эту", "моя", "впрочем",
    "хорошо", "свою", "этой", "перед", "иногда", "лучше", "чуть", "том",
    "нельзя", "такой", "им", "более", "всегда", "конечно", "всю", "между",
];

/// Russian normalization: NFKC fold, lowercase, alphabetic tokens only,
/// stopword and short-token removal, Snowball stemming.
///
/// Owns all of its state; construct once and pass by reference into the
/// build steps and the vector query path.
pub struct RussianAnalyzer {
    token_re: Regex,
    stemmer: Stemmer,
    stopwords: HashSet<&'static str>,
}

impl RussianAnalyzer {
    pub fn new() -> Self {
        Self {
            token_re: Regex::new(r"(?u)\p{L}+").expect("valid regex"),
            stemmer: Stemmer::create(Algorithm::Russian),
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }
}

impl Default for RussianAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for RussianAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut terms = Vec::new();
        for mat in self.token_re.find_iter(&normalized) {
            let token = mat.as_str();
            if self.stopwords.contains(token) || token.chars().count() <= 2 {
                continue;
            }
            terms.push(self.stemmer.stem(token).to_string());
        }
        terms
    }
}
