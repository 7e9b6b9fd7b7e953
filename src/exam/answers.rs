use std::collections::BTreeMap;

use crate::error::ExamError;
use crate::models::Quiz;

/// 作答记录：题目下标 → 选项下标
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    selections: BTreeMap<usize, usize>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次作答，同一题重复作答以最后一次为准
    pub fn record(&mut self, quiz: &Quiz, question: usize, option: usize) -> Result<(), ExamError> {
        let q = quiz
            .questions
            .get(question)
            .ok_or(ExamError::QuestionOutOfRange {
                index: question,
                count: quiz.question_count(),
            })?;
        if option >= q.options.len() {
            return Err(ExamError::OptionOutOfRange {
                question,
                option,
                count: q.options.len(),
            });
        }
        self.selections.insert(question, option);
        Ok(())
    }

    pub fn get(&self, question: usize) -> Option<usize> {
        self.selections.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.selections.iter().map(|(q, o)| (*q, *o))
    }

    /// 答对的题目数
    pub fn correct_count(&self, quiz: &Quiz) -> usize {
        quiz.questions
            .iter()
            .enumerate()
            .filter(|(idx, q)| self.get(*idx) == Some(q.correct_option))
            .count()
    }

    /// 百分制成绩：round(100 × 答对数 / 题目数)，0.5 向上取整
    pub fn score(&self, quiz: &Quiz) -> u8 {
        let total = quiz.question_count();
        if total == 0 {
            return 0;
        }
        let correct = self.correct_count(quiz);
        ((200 * correct + total) / (2 * total)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Question;

    fn quiz_with(correct: &[usize]) -> Quiz {
        Quiz {
            id: "quiz-1".to_string(),
            title: "测试".to_string(),
            questions: correct
                .iter()
                .enumerate()
                .map(|(i, c)| Question {
                    question_text: format!("Q{}", i + 1),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_option: *c,
                })
                .collect(),
            duration_seconds: None,
        }
    }

    #[test]
    fn test_record_validates_indices() {
        let quiz = quiz_with(&[0, 1]);
        let mut answers = AnswerSet::new();
        assert_eq!(
            answers.record(&quiz, 2, 0),
            Err(ExamError::QuestionOutOfRange { index: 2, count: 2 })
        );
        assert_eq!(
            answers.record(&quiz, 0, 4),
            Err(ExamError::OptionOutOfRange {
                question: 0,
                option: 4,
                count: 4
            })
        );
        assert!(answers.is_empty());

        answers.record(&quiz, 1, 3).unwrap();
        answers.record(&quiz, 1, 1).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(1), Some(1));
    }

    #[test]
    fn test_score_rounding() {
        let quiz = quiz_with(&[0, 0, 0]);
        let mut answers = AnswerSet::new();
        assert_eq!(answers.score(&quiz), 0);
        answers.record(&quiz, 0, 0).unwrap();
        assert_eq!(answers.score(&quiz), 33);
        answers.record(&quiz, 1, 0).unwrap();
        assert_eq!(answers.score(&quiz), 67);
        answers.record(&quiz, 2, 0).unwrap();
        assert_eq!(answers.score(&quiz), 100);

        // 12.5 → 13
        let quiz = quiz_with(&[1; 8]);
        let mut answers = AnswerSet::new();
        answers.record(&quiz, 5, 1).unwrap();
        assert_eq!(answers.score(&quiz), 13);
    }

    #[test]
    fn test_score_matches_formula_for_all_counts() {
        for total in 1..=25usize {
            let quiz = quiz_with(&vec![2; total]);
            for correct in 0..=total {
                let mut answers = AnswerSet::new();
                for q in 0..total {
                    let option = if q < correct { 2 } else { 3 };
                    answers.record(&quiz, q, option).unwrap();
                }
                let expected = (100.0 * correct as f64 / total as f64).round() as u8;
                let score = answers.score(&quiz);
                assert_eq!(score, expected, "{}/{}", correct, total);
                assert!(score <= 100);
            }
        }
    }

    #[test]
    fn test_unanswered_questions_are_wrong() {
        let quiz = quiz_with(&[0, 1, 2, 3]);
        let mut answers = AnswerSet::new();
        answers.record(&quiz, 3, 3).unwrap();
        assert_eq!(answers.correct_count(&quiz), 1);
        assert_eq!(answers.score(&quiz), 25);
    }
}
