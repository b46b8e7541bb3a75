use shared::{
    domain::CategoryId,
    error::ValidationError,
    records::{Question, QuestionPayload},
};

use super::{category_id, required};
use crate::{
    error::ClientError,
    resource::{Capabilities, DraftForm, Resource},
    transport::ResourceRequest,
};

/// Questions are listed per category, so the descriptor carries its scope.
#[derive(Debug, Clone, Copy)]
pub struct Questions {
    pub category_id: CategoryId,
}

impl Questions {
    pub fn for_category(category_id: CategoryId) -> Self {
        Self { category_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionForm {
    pub text: String,
    pub question_type: String,
    pub category_id: String,
    pub possible_answers: Vec<String>,
}

impl Default for QuestionForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            question_type: String::new(),
            category_id: String::new(),
            possible_answers: vec![String::new()],
        }
    }
}

impl QuestionForm {
    pub fn add_answer(&mut self) {
        self.possible_answers.push(String::new());
    }

    pub fn remove_answer(&mut self, index: usize) {
        if index < self.possible_answers.len() {
            self.possible_answers.remove(index);
        }
    }
}

impl DraftForm<Question> for QuestionForm {
    type Payload = QuestionPayload;

    fn from_record(record: &Question) -> Self {
        Self {
            text: record.text.clone(),
            question_type: record.question_type.clone(),
            category_id: record.category_id.to_string(),
            possible_answers: record.possible_answers.clone(),
        }
    }

    fn validate(&self) -> Result<QuestionPayload, ValidationError> {
        Ok(QuestionPayload {
            text: required("text", &self.text)?,
            question_type: required("questionType", &self.question_type)?,
            category_id: category_id(&self.category_id)?,
            possible_answers: self
                .possible_answers
                .iter()
                .map(|answer| answer.trim())
                .filter(|answer| !answer.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

impl Resource for Questions {
    type Record = Question;
    type Form = QuestionForm;

    const NAME: &'static str = "question";
    const LABEL: &'static str = "Question";

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            create: true,
            update: false,
            remove: false,
        }
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get(format!("Question/category/{}", self.category_id))
    }

    fn new_form(&self) -> QuestionForm {
        QuestionForm {
            category_id: self.category_id.to_string(),
            ..QuestionForm::default()
        }
    }

    /// A question outside the listed category would never show up in this
    /// collection, so it is refused here.
    fn create_request(&self, payload: &QuestionPayload) -> Result<ResourceRequest, ClientError> {
        if payload.category_id != self.category_id {
            return Err(ValidationError::new(
                "categoryId",
                format!("must be {} for this question list", self.category_id),
            )
            .into());
        }
        ResourceRequest::post("Question/AddQuestion").json(payload)
    }
}
