mod intent_form;
mod submit_intent;
