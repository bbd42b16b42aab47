use super::block::ExceptionBlock;
use super::metadata::TypeRef;

#[test]
fn directives() {
    let catch = ExceptionBlock::BeginCatchBlock(TypeRef::new("System.Exception"));

    assert_eq!(
        ExceptionBlock::BeginExceptionBlock.directive().as_deref(),
        Some(".try")
    );
    assert_eq!(catch.directive().as_deref(), Some(".catch System.Exception"));
    assert_eq!(
        ExceptionBlock::BeginExceptFilterBlock.directive().as_deref(),
        Some(".filter")
    );
    assert_eq!(ExceptionBlock::BeginFaultBlock.directive().as_deref(), Some(".fault"));
    assert_eq!(
        ExceptionBlock::BeginFinallyBlock.directive().as_deref(),
        Some(".finally")
    );
    assert_eq!(ExceptionBlock::EndExceptionBlock.directive(), None);
}
