//! Lexicon-based polarity scoring.
//!
//! Each lexicon word contributes its polarity in [-1, 1]. An intensifier
//! directly before a word scales it. A negation directly before the word, or
//! directly before its intensifier, flips and halves it. The score of a text is the mean contribution of the words
//! that were found in the lexicon, clamped to [-1, 1].

use phf::phf_map;

static POLARITY: phf::Map<&'static str, f64> = phf_map! {
    // negative
    "abandoned" => -0.4,
    "abnormal" => -0.3,
    "abysmal" => -1.0,
    "afraid" => -0.6,
    "aggressive" => -0.3,
    "alarming" => -0.6,
    "angry" => -0.5,
    "annoying" => -0.6,
    "anxious" => -0.3,
    "appalling" => -0.9,
    "ashamed" => -0.5,
    "awful" => -1.0,
    "bad" => -0.7,
    "battered" => -0.5,
    "bitter" => -0.3,
    "bleak" => -0.6,
    "bloody" => -0.6,
    "broken" => -0.4,
    "brutal" => -0.8,
    "burning" => -0.3,
    "catastrophic" => -0.9,
    "chaos" => -0.6,
    "chaotic" => -0.6,
    "collapsed" => -0.5,
    "crashed" => -0.5,
    "crazy" => -0.6,
    "critical" => -0.5,
    "crippled" => -0.6,
    "crisis" => -0.5,
    "cruel" => -1.0,
    "crushed" => -0.6,
    "damaged" => -0.5,
    "damaging" => -0.5,
    "danger" => -0.6,
    "dangerous" => -0.6,
    "dark" => -0.15,
    "dead" => -0.8,
    "deadly" => -0.9,
    "death" => -0.8,
    "deaths" => -0.8,
    "desperate" => -0.6,
    "destroyed" => -0.8,
    "destruction" => -0.8,
    "destructive" => -0.8,
    "devastated" => -0.8,
    "devastating" => -0.9,
    "devastation" => -0.8,
    "dire" => -0.7,
    "dirty" => -0.6,
    "disaster" => -0.7,
    "disastrous" => -0.9,
    "disturbing" => -0.5,
    "dreadful" => -0.9,
    "drowned" => -0.7,
    "dying" => -0.7,
    "emergency" => -0.4,
    "evacuate" => -0.4,
    "evacuated" => -0.4,
    "evil" => -1.0,
    "extreme" => -0.5,
    "failed" => -0.5,
    "fatal" => -0.8,
    "fatalities" => -0.8,
    "fear" => -0.6,
    "feared" => -0.6,
    "fearful" => -0.6,
    "fierce" => -0.4,
    "frightening" => -0.6,
    "furious" => -0.5,
    "grave" => -0.5,
    "grief" => -0.7,
    "grim" => -0.6,
    "harmful" => -0.6,
    "harsh" => -0.5,
    "hazardous" => -0.6,
    "helpless" => -0.5,
    "homeless" => -0.5,
    "horrible" => -1.0,
    "horrific" => -1.0,
    "hostile" => -0.5,
    "hurt" => -0.5,
    "ill" => -0.5,
    "injured" => -0.6,
    "injuries" => -0.6,
    "killed" => -0.8,
    "lethal" => -0.8,
    "lost" => -0.4,
    "massive" => -0.2,
    "miserable" => -0.8,
    "missing" => -0.4,
    "mourning" => -0.6,
    "nasty" => -1.0,
    "negative" => -0.3,
    "nightmare" => -0.8,
    "pain" => -0.6,
    "painful" => -0.7,
    "panic" => -0.7,
    "poor" => -0.4,
    "problem" => -0.3,
    "ruined" => -0.7,
    "sad" => -0.5,
    "scared" => -0.6,
    "scary" => -0.5,
    "serious" => -0.3,
    "severe" => -0.5,
    "shocking" => -0.8,
    "sick" => -0.7,
    "slow" => -0.3,
    "stranded" => -0.5,
    "stupid" => -0.8,
    "suffering" => -0.6,
    "terrible" => -1.0,
    "terrified" => -0.8,
    "terrifying" => -0.8,
    "threat" => -0.4,
    "threatened" => -0.4,
    "toxic" => -0.6,
    "tragedy" => -0.8,
    "tragic" => -0.9,
    "trapped" => -0.6,
    "trouble" => -0.4,
    "ugly" => -0.7,
    "unable" => -0.5,
    "unfortunate" => -0.5,
    "unhappy" => -0.6,
    "unsafe" => -0.5,
    "upset" => -0.4,
    "urgent" => -0.3,
    "victims" => -0.6,
    "violent" => -0.8,
    "vulnerable" => -0.4,
    "warning" => -0.3,
    "weak" => -0.4,
    "worried" => -0.4,
    "worse" => -0.4,
    "worst" => -1.0,
    "wounded" => -0.6,
    "wrecked" => -0.6,
    "wrong" => -0.5,
    // positive
    "amazing" => 0.6,
    "awesome" => 1.0,
    "beautiful" => 0.85,
    "best" => 1.0,
    "better" => 0.5,
    "brave" => 0.8,
    "brilliant" => 0.9,
    "calm" => 0.3,
    "clean" => 0.4,
    "cool" => 0.35,
    "delighted" => 0.7,
    "enjoy" => 0.4,
    "excellent" => 1.0,
    "fantastic" => 0.4,
    "fine" => 0.4,
    "fortunate" => 0.5,
    "fun" => 0.3,
    "glad" => 0.5,
    "good" => 0.7,
    "grateful" => 0.6,
    "great" => 0.8,
    "happy" => 0.8,
    "helpful" => 0.5,
    "hero" => 0.5,
    "hope" => 0.4,
    "hopeful" => 0.5,
    "impressive" => 1.0,
    "incredible" => 0.9,
    "love" => 0.5,
    "lovely" => 0.5,
    "lucky" => 0.5,
    "nice" => 0.6,
    "perfect" => 1.0,
    "pleasant" => 0.7,
    "positive" => 0.2,
    "proud" => 0.8,
    "recovered" => 0.4,
    "relief" => 0.4,
    "relieved" => 0.4,
    "rescued" => 0.5,
    "restored" => 0.4,
    "safe" => 0.5,
    "secure" => 0.4,
    "stable" => 0.3,
    "strong" => 0.4,
    "success" => 0.3,
    "successful" => 0.75,
    "super" => 0.3,
    "superb" => 1.0,
    "thankful" => 0.5,
    "wonderful" => 1.0,
};

static INTENSIFIERS: phf::Map<&'static str, f64> = phf_map! {
    "absolutely" => 1.5,
    "deeply" => 1.3,
    "extremely" => 1.5,
    "highly" => 1.3,
    "incredibly" => 1.5,
    "really" => 1.3,
    "so" => 1.3,
    "too" => 1.3,
    "totally" => 1.4,
    "very" => 1.3,
};

static NEGATIONS: phf::Set<&'static str> = phf::phf_set! {
    "aint", "arent", "cannot", "cant", "didnt", "doesnt", "dont", "hardly",
    "isnt", "never", "no", "nor", "not", "wasnt", "werent", "without",
};

const NEGATION_FACTOR: f64 = -0.5;

pub fn polarity(text: &str) -> f64 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut total = 0.0;
    let mut scored = 0usize;

    for (i, word) in words.iter().enumerate() {
        let Some(&base) = POLARITY.get(word.as_str()) else {
            continue;
        };

        let mut value = base;
        // k: leftmost word of the phrase, modifiers included
        let mut k = i;
        if k > 0 {
            if let Some(&factor) = INTENSIFIERS.get(words[k - 1].as_str()) {
                value *= factor;
                k -= 1;
            }
        }
        if k > 0 && NEGATIONS.contains(words[k - 1].as_str()) {
            value *= NEGATION_FACTOR;
        }

        total += value;
        scored += 1;
    }

    if scored == 0 {
        return 0.0;
    }

    (total / scored as f64).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_neutral_text() {
        assert_eq!(polarity(""), 0.0);
        assert_eq!(polarity("green earthquake alert in chile"), 0.0);
    }

    #[test]
    fn test_mean_of_scored_words() {
        // deadly -0.9, severe -0.5
        assert!(approx(polarity("deadly flood and severe storm"), -0.7));
    }

    #[test]
    fn test_intensifier_scales() {
        assert!(approx(polarity("very dangerous"), -0.78));
    }

    #[test]
    fn test_negation_flips_and_halves() {
        assert!(approx(polarity("not good"), -0.35));
        assert!(approx(polarity("not dangerous"), 0.3));
    }

    #[test]
    fn test_negation_reaches_past_intensifier() {
        // good 0.7 * very 1.3 * -0.5
        assert!(approx(polarity("not very good"), -0.455));
        assert!(approx(polarity("it was not so bad"), 0.455));
        // a negation two words back without an intensifier between is ignored
        assert!(approx(polarity("not the good one"), 0.7));
    }

    #[test]
    fn test_common_news_words_are_scored() {
        assert!(polarity("horrific scenes as homeless families suffer") < -0.2);
        assert!(polarity("crews restored power and everyone is safe") > 0.0);
    }

    #[test]
    fn test_clamped() {
        assert_eq!(polarity("extremely horrible"), -1.0);
        assert_eq!(polarity("extremely wonderful"), 1.0);
    }

    #[test]
    fn test_below_alert_threshold() {
        assert!(polarity("m km sw of tonga") >= -0.2);
        assert!(polarity("people killed as flood waters rise") < -0.2);
    }
}
