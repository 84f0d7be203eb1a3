// Resume import prompt template.

pub const RESUME_IMPORT_SYSTEM: &str = "\
You extract structured data from resume text. Copy facts exactly as written; never invent \
employers, dates or degrees. Use null for anything missing. Return a JSON object of this shape:
{
  \"full_name\": \"string\",
  \"email\": \"string\" | null,
  \"phone\": \"string\" | null,
  \"location\": \"string\" | null,
  \"summary\": \"string\" | null,
  \"skills\": [\"string\"],
  \"experience\": [
    {
      \"title\": \"string\",
      \"company\": \"string\",
      \"location\": \"string\" | null,
      \"start_date\": \"string\" | null,
      \"end_date\": \"string\" | null,
      \"current\": boolean,
      \"description\": \"string\" | null
    }
  ],
  \"education\": [
    {
      \"institution\": \"string\",
      \"degree\": \"string\" | null,
      \"field\": \"string\" | null,
      \"start_date\": \"string\" | null,
      \"end_date\": \"string\" | null,
      \"description\": \"string\" | null
    }
  ]
}";

/// Upper bound on extracted text forwarded to the model.
pub const MAX_IMPORT_CHARS: usize = 20_000;
