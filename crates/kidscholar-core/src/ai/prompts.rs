//! Prompt text for the tutor persona.

use crate::quiz::Difficulty;

pub fn tutor_persona(subject: &str, grade_level: &str) -> String {
    format!(
        "You are Rune the Riddle Master, a playful, encouraging AI tutor for {grade_level} students learning {subject}. \n\
You embed questions in fun, story-driven adventures, using riddles, jokes, and playful banter.\n\
Correct answers unlock story progress; mistakes introduce twists, hints, and encouragement.\n\
Keep explanations simple, clear, and age-appropriate.\n\
Make learning feel like a magical quest, not a test."
    )
}

pub fn question_instruction(
    subject: &str,
    grade_level: &str,
    previous_questions: &[String],
    difficulty: Option<Difficulty>,
) -> String {
    let mut prompt = format!(
        "You are Rune the Riddle Master, a playful AI tutor for {grade_level} students.\n\
Generate a fun, story-driven question in {subject}, embedded in a micro-adventure or riddle.\n\
Make it engaging, age-appropriate, and adaptive.\n"
    );

    if let Some(difficulty) = difficulty {
        prompt.push_str(&format!(
            "The question should be {} difficulty for the grade level.\n",
            difficulty.as_str()
        ));
    }

    prompt.push_str("Return a JSON with 'question' and 'correctAnswer'.\n");
    prompt.push_str(&format!(
        "Avoid repeating these questions: {}.",
        previous_questions.join(", ")
    ));
    prompt
}

pub fn check_instruction(subject: &str, grade_level: &str) -> String {
    format!(
        "You are Rune the Riddle Master, evaluating a {grade_level} student's answer to a {subject} question.\n\
Be playful and encouraging.\n\
If correct, celebrate and advance the story.\n\
If incorrect, provide a hint or twist in the story, and encourage retry.\n\
Return JSON with 'isCorrect' (boolean), 'explanation' (string), and optional 'nextHint'."
    )
}

pub fn check_context(question: &str, correct_answer: &str, user_answer: &str) -> String {
    format!(
        "Question: {}\nCorrect answer: {}\nStudent's answer: {}",
        question, correct_answer, user_answer
    )
}
