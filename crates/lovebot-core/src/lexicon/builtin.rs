//! Builtin lexicon data.

use super::LanguageSpec;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn english() -> LanguageSpec {
    LanguageSpec {
        code: "en".to_string(),
        name: "english".to_string(),
        relationship_keywords: owned(&[
            "relationship",
            "partner",
            "boyfriend",
            "girlfriend",
            "husband",
            "wife",
            "spouse",
            "marriage",
            "married",
            "divorce",
            "breakup",
            "break up",
            "broke up",
            "dating",
            "date night",
            "fight",
            "fighting",
            "argue",
            "arguing",
            "argument",
            "cheating",
            "cheated",
            "affair",
            "trust",
            "jealous",
            "jealousy",
            "commitment",
            "intimacy",
            "romantic",
            "romance",
            "anniversary",
            "boundaries",
            "compromise",
            "apologize",
            "apology",
            "forgive",
        ]),
        emotional_keywords: owned(&[
            "feel",
            "hurt",
            "sad",
            "angry",
            "upset",
            "frustrated",
            "lonely",
            "anxious",
            "stressed",
            "worried",
            "scared",
            "disappointed",
            "ignored",
            "unappreciated",
            "crying",
            "fed up",
            "tired of",
            "heartbroken",
            "grateful",
            "happy",
        ]),
        advice_keywords: owned(&["advice", "suggest", "recommend", "you could try"]),
        question_patterns: owned(&[
            r"\?",
            r"^\s*(what|how|why|when|where|who|should|could|would|can|do|does|did|is|are|am)\b",
        ]),
        direct_request_patterns: owned(&[
            r"\bwhat should (i|we) do\b",
            r"\bany (advice|tips|suggestions)\b",
            r"\bgive (me|us) (some )?advice\b",
            r"\bneed (some )?(advice|help)\b",
            r"\bhelp (me|us)\b",
            r"\bwhat do you think\b",
            r"\bcan you help\b",
        ]),
    }
}

fn spanish() -> LanguageSpec {
    LanguageSpec {
        code: "es".to_string(),
        name: "spanish".to_string(),
        relationship_keywords: owned(&[
            "pareja",
            "novio",
            "novia",
            "esposo",
            "esposa",
            "marido",
            "matrimonio",
            "relación",
            "relacion",
            "divorcio",
            "separación",
            "ruptura",
            "pelea",
            "peleando",
            "discutir",
            "discutiendo",
            "discusión",
            "celos",
            "celoso",
            "celosa",
            "confianza",
            "infiel",
            "engaño",
            "amor",
            "aniversario",
            "compromiso",
            "perdonar",
        ]),
        emotional_keywords: owned(&[
            "siento",
            "triste",
            "enojado",
            "enojada",
            "molesto",
            "molesta",
            "dolido",
            "dolida",
            "frustrado",
            "frustrada",
            "ansioso",
            "ansiosa",
            "preocupado",
            "preocupada",
            "llorando",
            "harto",
            "harta",
            "feliz",
        ]),
        advice_keywords: owned(&["consejo", "sugiero", "recomiendo", "intenta"]),
        question_patterns: owned(&[
            r"¿",
            r"\?",
            r"^\s*(qué|que|cómo|como|por qué|cuándo|debo|debería)\b",
        ]),
        direct_request_patterns: owned(&[
            r"qu[eé] (debo|deber[ií]a|deber[ií]amos|hago|hacemos)\b",
            r"\b(alg[uú]n|un) consejo\b",
            r"\bay[uú]da(me|nos)\b",
            r"\bnecesito (ayuda|consejo)\b",
            r"\bqu[eé] (opinas|piensas)\b",
        ]),
    }
}

fn hebrew() -> LanguageSpec {
    LanguageSpec {
        code: "he".to_string(),
        name: "hebrew".to_string(),
        relationship_keywords: owned(&[
            "זוגיות",
            "בן זוג",
            "בת זוג",
            "החבר שלי",
            "החברה שלי",
            "בעלי",
            "אשתי",
            "נישואים",
            "גירושים",
            "פרידה",
            "ריב",
            "רבנו",
            "מריבה",
            "ויכוח",
            "קנאה",
            "מקנא",
            "אמון",
            "בגידה",
            "אהבה",
            "יום נישואים",
            "דייט",
            "מחויבות",
        ]),
        emotional_keywords: owned(&[
            "מרגיש",
            "מרגישה",
            "עצוב",
            "עצובה",
            "כועס",
            "כועסת",
            "פגוע",
            "פגועה",
            "מתוסכל",
            "מתוסכלת",
            "בודד",
            "בודדה",
            "לחוץ",
            "לחוצה",
            "דואג",
            "דואגת",
            "בוכה",
            "נמאס",
            "שמח",
        ]),
        advice_keywords: owned(&["עצה", "ממליץ", "ממליצה", "כדאי לכם"]),
        question_patterns: owned(&[r"\?", r"^\s*(מה|איך|למה|מתי|האם|כדאי)\s"]),
        direct_request_patterns: owned(&[
            r"מה (לעשות|אני אמור|אני אמורה|אנחנו אמורים)",
            r"(תן|תני|תנו) (לי|לנו) עצה",
            r"(צריך|צריכה|צריכים) עצה",
            r"(תעזור|תעזרי|עזור|עזרי) (לי|לנו)",
            r"מה דעתך",
        ]),
    }
}

fn thai() -> LanguageSpec {
    LanguageSpec {
        code: "th".to_string(),
        name: "thai".to_string(),
        relationship_keywords: owned(&[
            "แฟน",
            "คู่รัก",
            "สามี",
            "ภรรยา",
            "ความสัมพันธ์",
            "แต่งงาน",
            "หย่า",
            "เลิกกัน",
            "ทะเลาะ",
            "เถียง",
            "หึง",
            "ไว้ใจ",
            "นอกใจ",
            "ความรัก",
            "ครบรอบ",
            "เดท",
            "คบกัน",
            "ขอโทษ",
        ]),
        emotional_keywords: owned(&[
            "รู้สึก",
            "เสียใจ",
            "โกรธ",
            "เศร้า",
            "น้อยใจ",
            "เหงา",
            "เครียด",
            "กังวล",
            "ร้องไห้",
            "เบื่อ",
            "ผิดหวัง",
            "ดีใจ",
        ]),
        advice_keywords: owned(&["คำแนะนำ", "แนะนำ"]),
        // Thai is written without spaces between words, so no word boundaries.
        question_patterns: owned(&[r"\?", r"(ไหม|มั้ย|หรือเปล่า|อย่างไร|ยังไง|ทำไม|อะไร)"]),
        direct_request_patterns: owned(&[
            r"ควร(จะ)?ทำ(ยังไง|อย่างไร)",
            r"ขอคำแนะนำ",
            r"ช่วย(ด้วย|หน่อย)",
            r"แนะนำหน่อย",
        ]),
    }
}

/// The builtin languages, in scoring order.
pub fn builtin_specs() -> Vec<LanguageSpec> {
    vec![english(), spanish(), hebrew(), thai()]
}
