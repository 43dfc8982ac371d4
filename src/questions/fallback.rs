//! Embedded question set used when the upstream provider is unavailable.

use super::{Question, QuestionRequest};

struct FallbackQuestion {
    id: &'static str,
    category: &'static str,
    difficulty: &'static str,
    text: &'static str,
    correct: &'static str,
    incorrect: [&'static str; 3],
}

const FALLBACK_QUESTIONS: &[FallbackQuestion] = &[
    FallbackQuestion {
        id: "local-science-easy-1",
        category: "science",
        difficulty: "easy",
        text: "What planet is known as the Red Planet?",
        correct: "Mars",
        incorrect: ["Venus", "Jupiter", "Mercury"],
    },
    FallbackQuestion {
        id: "local-science-easy-2",
        category: "science",
        difficulty: "easy",
        text: "What gas do plants absorb from the atmosphere?",
        correct: "Carbon dioxide",
        incorrect: ["Oxygen", "Nitrogen", "Hydrogen"],
    },
    FallbackQuestion {
        id: "local-science-medium-1",
        category: "science",
        difficulty: "medium",
        text: "What is the chemical symbol for potassium?",
        correct: "K",
        incorrect: ["P", "Po", "Pt"],
    },
    FallbackQuestion {
        id: "local-science-hard-1",
        category: "science",
        difficulty: "hard",
        text: "What particle is exchanged in the electromagnetic force?",
        correct: "Photon",
        incorrect: ["Gluon", "W boson", "Graviton"],
    },
    FallbackQuestion {
        id: "local-history-easy-1",
        category: "history",
        difficulty: "easy",
        text: "In which year did the Second World War end?",
        correct: "1945",
        incorrect: ["1939", "1944", "1950"],
    },
    FallbackQuestion {
        id: "local-history-medium-1",
        category: "history",
        difficulty: "medium",
        text: "Who was the first President of the United States?",
        correct: "George Washington",
        incorrect: ["Thomas Jefferson", "John Adams", "Abraham Lincoln"],
    },
    FallbackQuestion {
        id: "local-history-hard-1",
        category: "history",
        difficulty: "hard",
        text: "Which treaty ended the Thirty Years' War in 1648?",
        correct: "The Peace of Westphalia",
        incorrect: [
            "The Treaty of Versailles",
            "The Treaty of Utrecht",
            "The Peace of Augsburg",
        ],
    },
    FallbackQuestion {
        id: "local-geography-easy-1",
        category: "geography",
        difficulty: "easy",
        text: "What is the capital of France?",
        correct: "Paris",
        incorrect: ["Lyon", "Marseille", "Nice"],
    },
    FallbackQuestion {
        id: "local-geography-medium-1",
        category: "geography",
        difficulty: "medium",
        text: "Which river is the longest in Africa?",
        correct: "The Nile",
        incorrect: ["The Congo", "The Niger", "The Zambezi"],
    },
    FallbackQuestion {
        id: "local-geography-hard-1",
        category: "geography",
        difficulty: "hard",
        text: "Which country has the most time zones, including overseas territories?",
        correct: "France",
        incorrect: ["Russia", "The United States", "China"],
    },
    FallbackQuestion {
        id: "local-music-easy-1",
        category: "music",
        difficulty: "easy",
        text: "How many strings does a standard guitar have?",
        correct: "Six",
        incorrect: ["Four", "Five", "Seven"],
    },
    FallbackQuestion {
        id: "local-music-medium-1",
        category: "music",
        difficulty: "medium",
        text: "Which composer wrote the Ninth Symphony while almost completely deaf?",
        correct: "Ludwig van Beethoven",
        incorrect: [
            "Wolfgang Amadeus Mozart",
            "Johann Sebastian Bach",
            "Franz Schubert",
        ],
    },
    FallbackQuestion {
        id: "local-film-easy-1",
        category: "film_and_tv",
        difficulty: "easy",
        text: "Who directed the film Jaws?",
        correct: "Steven Spielberg",
        incorrect: ["George Lucas", "Martin Scorsese", "Francis Ford Coppola"],
    },
    FallbackQuestion {
        id: "local-film-medium-1",
        category: "film_and_tv",
        difficulty: "medium",
        text: "Which film won the first Academy Award for Best Picture?",
        correct: "Wings",
        incorrect: ["Sunrise", "Metropolis", "The Jazz Singer"],
    },
    FallbackQuestion {
        id: "local-general-easy-1",
        category: "general_knowledge",
        difficulty: "easy",
        text: "How many sides does a hexagon have?",
        correct: "Six",
        incorrect: ["Five", "Seven", "Eight"],
    },
    FallbackQuestion {
        id: "local-general-medium-1",
        category: "general_knowledge",
        difficulty: "medium",
        text: "What is the smallest prime number greater than 100?",
        correct: "101",
        incorrect: ["103", "107", "111"],
    },
];

impl FallbackQuestion {
    fn to_question(&self) -> Question {
        Question {
            id: self.id.to_string(),
            category: self.category.to_string(),
            difficulty: self.difficulty.to_string(),
            text: self.text.to_string(),
            correct_answer: self.correct.to_string(),
            incorrect_answers: self.incorrect.iter().map(ToString::to_string).collect(),
        }
    }

    fn matches(&self, request: &QuestionRequest) -> bool {
        if request.exclude_ids.contains(self.id) {
            return false;
        }
        if let Some(category) = &request.category {
            if self.category != category.as_str() {
                return false;
            }
        }
        if let Some(difficulty) = &request.difficulty {
            if self.difficulty != difficulty.as_str() {
                return false;
            }
        }
        true
    }
}

/// Pick an unused embedded question honoring the request filters.
///
/// Filters are relaxed in stages so the host still gets a question when the
/// exact category/difficulty combination is exhausted locally: exact match
/// first, then same category any difficulty, then anything unused.
pub fn pick(request: &QuestionRequest) -> Option<Question> {
    if let Some(q) = FALLBACK_QUESTIONS.iter().find(|q| q.matches(request)) {
        return Some(q.to_question());
    }

    let category_only = QuestionRequest {
        category: request.category.clone(),
        difficulty: None,
        exclude_ids: request.exclude_ids.clone(),
    };
    if let Some(q) = FALLBACK_QUESTIONS.iter().find(|q| q.matches(&category_only)) {
        return Some(q.to_question());
    }

    let unused_only = QuestionRequest {
        category: None,
        difficulty: None,
        exclude_ids: request.exclude_ids.clone(),
    };
    FALLBACK_QUESTIONS
        .iter()
        .find(|q| q.matches(&unused_only))
        .map(FallbackQuestion::to_question)
}
