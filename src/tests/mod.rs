mod evaluator_tests;
mod fixtures;
mod property_tests;
