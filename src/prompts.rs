//! Instruction text sent to the generation service.

use crate::model::QuizTypeMode;

const MCQ_INSTRUCTIONS: &str = "All questions must be multiple-choice. The 'questionType' for all questions must be 'mcq'. \
You must provide an 'options' field which is an array of 4 strings: 3 incorrect but plausible distractors, and the one correct answer. \
The 'answer' field must exactly match one of the strings in the 'options' array.";

const DESCRIPTIVE_INSTRUCTIONS: &str = "All questions must be descriptive (open-ended). \
The 'questionType' for all questions must be 'descriptive'. Do not include an 'options' field.";

const BLEND_INSTRUCTIONS: &str = "Generate a mix of descriptive (open-ended) and multiple-choice questions. \
For multiple-choice questions, set 'questionType' to 'mcq' and provide an 'options' field which is an array of 4 strings (3 incorrect, 1 correct). \
The 'answer' field must match one of the options. \
For descriptive questions, set 'questionType' to 'descriptive' and do not include the 'options' field.";

/// The clause that pins down which question types the model may produce.
pub fn mode_instructions(mode: QuizTypeMode) -> &'static str {
    match mode {
        QuizTypeMode::Mcq => MCQ_INSTRUCTIONS,
        QuizTypeMode::Descriptive => DESCRIPTIVE_INSTRUCTIONS,
        QuizTypeMode::Blend => BLEND_INSTRUCTIONS,
    }
}

/// Build the question-generation instruction for `user_name`.
///
/// The name and passage are interpolated verbatim; neither is escaped.
pub fn guided_questions_instruction(text: &str, mode: QuizTypeMode, user_name: &str) -> String {
    format!(
        "You are an expert literary analysis tutor. You are creating a personalized quiz for your student, {name}.\n\
Analyze the following text and generate a series of guided questions to help {name} understand it. The text is: \"{text}\".\n\
Based on your analysis, create an array of 5-7 questions covering topics like Sentence Types, Figurative Language, Viewpoint, and Lexical Choice.\n\
{mode}\n\
For each question, provide the following in a strict JSON object format:\n\
- category: The analysis category (e.g., 'Sentence Types').\n\
- question: The question for the student. Frame it as if you are asking {name} directly.\n\
- hint: A helpful hint to guide the student.\n\
- answer: A concise, correct answer to the question.\n\
- explanation: A detailed explanation of the correct answer and its literary effect.\n\
- relevantText: The exact quote or text snippet from the original text that this question is about. This must be a verbatim substring from the provided text.\n\
- questionType: The type of question ('mcq' or 'descriptive').\n\
- options: (For 'mcq' type only) An array of 4 string options.\n\
Return ONLY the JSON array of question objects.",
        name = user_name,
        text = text,
        mode = mode_instructions(mode),
    )
}

/// Build the grading instruction comparing a student's answer with the reference.
pub fn evaluation_instruction(user_answer: &str, correct_answer: &str) -> String {
    format!(
        "You are an AI teaching assistant. A student was asked a question and the correct answer is: \"{correct}\".\n\
The student's answer is: \"{user}\".\n\
Please evaluate if the student's answer is correct. The student doesn't need to be perfectly verbatim, but their answer should capture the main idea of the correct answer.\n\
Respond in a strict JSON format with two keys:\n\
- isCorrect: A boolean value (true if the student's answer is substantially correct, otherwise false).\n\
- feedback: A short, encouraging feedback message for the student explaining why their answer was right or wrong.\n\
Return ONLY the JSON object.",
        correct = correct_answer,
        user = user_answer,
    )
}
