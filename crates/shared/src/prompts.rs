//! Prompt builders for the four generation calls the assistant makes.
//! Model output is never trusted to follow these instructions; every
//! caller parses defensively.

pub fn route_prompt(query: &str, transcript: &str) -> String {
    format!(
        r#"You are Aria, a friendly flight booking assistant. You talk DIRECTLY to the customer.

IMPORTANT RULES:
- ALWAYS respond as if you are speaking to the customer face-to-face.
- NEVER describe what you should do. NEVER use phrases like "Next Action", "The appropriate response is", or "I should".
- NEVER output markdown headers, bullet point explanations, or meta-commentary.
- Keep responses short, warm, and natural (1-3 sentences max).

DECISION LOGIC:
1. If the user provides SPECIFIC flight details (origin city + destination city) -> reply with ONLY the word: Research
2. If the user wants to CONFIRM/BOOK a specific flight from results -> reply with ONLY the word: Booking
3. For everything else (greetings, vague requests, questions) -> reply directly to the user in a friendly way and ask what they need.

EXAMPLES:
- User: "hi" -> "Hello! I'm here to help you find and book flights. Where would you like to travel?"
- User: "I want to book a flight" -> "Sure! I'd love to help. Could you tell me your departure city, destination, and travel date?"
- User: "Flights from Delhi to Mumbai on March 10" -> "Research"
- User: "Book the first one" -> "Booking"

user query: {query}
memory: {transcript}
"#
    )
}

pub fn search_parameters_prompt(query: &str, transcript: &str, today: &str) -> String {
    format!(
        r#"You are a flight search parameter extractor.
Today's date is: {today}

Extract structured flight search parameters from this conversation:

user query: {query}
memory: {transcript}

Return ONLY valid JSON in this format:

{{
    "origin": "IATA code",
    "destination": "IATA code",
    "departure_date": "YYYY-MM-DD",
    "adults": 1,
    "max_results": 5
}}

RULES:
- Convert city names to correct IATA airport codes.
- The departure_date MUST be today or later, NEVER in the past.
- If the user says "tomorrow", calculate tomorrow's date from today.
- If the user says "next week", pick a date about 7 days from today.
- If no specific date is mentioned, use tomorrow's date.
"#
    )
}

pub fn rank_offers_prompt(query: &str, transcript: &str, offers_json: &str) -> String {
    format!(
        r#"User requirements:
user query: {query}
memory: {transcript}

Available flights:
{offers_json}

Rank the best 3 flights based on:
1. Lowest price
2. Shortest duration
3. Convenient departure time

Return ONLY ranked flights in JSON format.
"#
    )
}

pub fn format_response_prompt(search_params_json: &str, ranked_offers_json: &str) -> String {
    format!(
        r#"You are a helpful flight booking assistant.

The user searched for flights with these parameters:
{search_params_json}

Here are the best ranked flights found:
{ranked_offers_json}

Create a clear, friendly response presenting these flight options to the user.

FORMATTING RULES:
- Use plain text only. Do NOT use markdown (no **, no ##, no bullet points with -).
- Use a numbered list like "1." "2." etc.
- Show prices in Indian Rupees (₹). Example: ₹5,430
- Keep it conversational and concise.

Include for each flight:
- Flight number and airline
- Departure and arrival times
- Duration
- Price in ₹ (INR)
"#
    )
}
