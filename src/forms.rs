//! Form submissions
//!
//! Raw field values as read from the page, and their conversion into records.
//! Only enrolment is validated; every other form is stored as typed.

use crate::school::{Course, FeeRecord, ResultRecord, StaffMember, Student};

/// Enrolment form fields
#[derive(Debug, Clone, Default)]
pub struct EnrolmentForm {
    pub name: String,
    pub student_id: String,
    pub class_name: String,
}

impl EnrolmentForm {
    /// Trimmed student, or `None` when name or student id is blank
    pub fn into_student(self) -> Option<Student> {
        let student = Student {
            student_id: self.student_id.trim().to_string(),
            name: self.name.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
        };
        if student.name.is_empty() || student.student_id.is_empty() {
            return None;
        }
        Some(student)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeeForm {
    pub student_id: String,
    pub amount: String,
    pub date: String,
}

impl From<FeeForm> for FeeRecord {
    fn from(form: FeeForm) -> Self {
        Self {
            student_id: form.student_id,
            amount: form.amount,
            date: form.date,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CourseForm {
    pub code: String,
    pub title: String,
}

impl From<CourseForm> for Course {
    fn from(form: CourseForm) -> Self {
        Self {
            code: form.code,
            title: form.title,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaffForm {
    pub name: String,
    pub role: String,
}

impl From<StaffForm> for StaffMember {
    fn from(form: StaffForm) -> Self {
        Self {
            name: form.name,
            role: form.role,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultForm {
    pub student_id: String,
    pub course: String,
    pub grade: String,
}

impl From<ResultForm> for ResultRecord {
    fn from(form: ResultForm) -> Self {
        Self {
            student_id: form.student_id,
            course: form.course,
            grade: form.grade,
        }
    }
}
