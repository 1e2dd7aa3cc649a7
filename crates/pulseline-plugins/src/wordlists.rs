//! Small built-in word lists backing the reference plugins.
//!
//! Deliberately tiny: enough signal for tests and demos. Real
//! deployments plug in external models through the same stage names.

pub(crate) const ITALIAN_STOP_WORDS: &[&str] = &[
    "il", "lo", "la", "i", "gli", "le", "un", "una", "di", "da", "in", "con", "su", "per", "tra",
    "fra", "che", "chi", "cui", "non", "come", "dove", "quando", "anche", "ancora", "ma", "sono",
    "sei", "siamo", "siete", "questo", "questa", "molto", "essere", "della", "del", "ciao",
];

pub(crate) const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "of", "from", "in", "with", "on", "for", "between", "that", "who", "which",
    "not", "how", "where", "when", "also", "still", "but", "am", "are", "is", "was", "were",
    "this", "very", "be", "and", "hello",
];

pub(crate) const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "love", "happy", "excellent", "wonderful", "amazing", "best", "beautiful",
    "bello", "buono", "ottimo", "felice", "fantastico", "meraviglioso", "migliore",
];

pub(crate) const NEGATIVE_WORDS: &[&str] = &[
    "bad", "awful", "hate", "sad", "terrible", "horrible", "worst", "ugly", "brutto", "cattivo",
    "pessimo", "triste", "terribile", "orribile", "peggiore",
];
